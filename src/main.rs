fn main() {
    if let Err(err) = goalsync_lib::run() {
        log::error!("goalsync failed: {err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
