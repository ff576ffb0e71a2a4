fn main() {
    if let Err(err) = speedsearch::cli::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
