fn main() {
    if let Err(e) = ark_inspect::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
