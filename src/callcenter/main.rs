mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", cli::describe_error(&e));
        std::process::exit(1);
    }
}
