fn main() {
    if let Err(e) = live_detect_lib::run() {
        log::error!("{e}");
        eprintln!("live-detect: {e}");
        std::process::exit(1);
    }
}
