use crate::CLAP_STYLING;
use clap::arg;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("pung")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pung")
        .styles(CLAP_STYLING)
        .about(
            "Deletes the recent comments of a Quasar Zone account, then blanks out its \
        remaining posts and comments.",
        )
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
}
