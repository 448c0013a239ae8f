fn main() {
    if let Err(err) = stylesync_lib::run() {
        eprintln!("stylesync: {err:#}");
        std::process::exit(1);
    }
}
