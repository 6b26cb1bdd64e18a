mod cli;
mod disk;
mod fs;

fn main() {
    std::process::exit(cli::run());
}
