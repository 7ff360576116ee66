use human_panic::{metadata, setup_panic};
use log::error;

fn main() {
    setup_panic!(metadata!().support("Please report this at the project's issue tracker."));

    if let Err(err) = hhbargain::cli::run_cli() {
        if hhbargain::log::is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}
