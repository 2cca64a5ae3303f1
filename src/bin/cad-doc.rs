use anyhow::Result;
use cad_doc_handler::cli;

fn main() -> Result<()> {
    cli::run()
}
