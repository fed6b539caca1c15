fn main() {
    if let Err(e) = palaver::cli::main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
