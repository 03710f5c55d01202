use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    serials::app::run_build_corpus(std::env::args().skip(1))
}
