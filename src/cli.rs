use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the background service: first import, periodic refresh and the
    /// local http api.
    Daemon {},

    /// Search the unified index.
    Search {
        /// Query words; prefix with `b:` to search bookmarks only.
        term: String,

        /// Print the number of matches instead of the records.
        #[clap(long, default_value = "false")]
        count: bool,
    },

    /// Import full history and bookmarks from every installed browser.
    Import {},

    /// Import history visited in the last N minutes.
    ImportRecent {
        #[clap(long, default_value = "2")]
        minutes: u64,
    },

    /// Show record and bookmark counts.
    Count {},

    /// Wipe the unified index, bookmarks included.
    Reset {
        /// Auto confirm.
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },
}
