use crate::storage::{BackendLocal, StorageManager};
use serde::{Deserialize, Serialize};

const DEFAULT_IMPORT_INTERVAL_SECS: u64 = 60;
const DEFAULT_RECENT_WINDOW_SECS: u64 = 120;
/// First-run backfill depth, roughly five years.
const DEFAULT_BACKFILL_DAYS: u64 = 5 * 365;
const DEFAULT_CHUNK_DAYS: u64 = 30;
/// Shortest query the daemon's live search path accepts.
const DEFAULT_MIN_QUERY_LEN: usize = 2;
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8674";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between periodic incremental imports. The next tick is armed
    /// only after the previous one settles.
    #[serde(default = "default_import_interval_secs")]
    pub import_interval_secs: u64,

    /// Recency window requested from sources on each periodic tick.
    #[serde(default = "default_recent_window_secs")]
    pub recent_window_secs: u64,

    #[serde(default = "default_backfill_days")]
    pub backfill_days: u64,

    /// Slice size for the first-run backfill.
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u64,

    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import_interval_secs: DEFAULT_IMPORT_INTERVAL_SECS,
            recent_window_secs: DEFAULT_RECENT_WINDOW_SECS,
            backfill_days: DEFAULT_BACKFILL_DAYS,
            chunk_days: DEFAULT_CHUNK_DAYS,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            base_path: String::new(),
        }
    }
}

fn default_import_interval_secs() -> u64 {
    DEFAULT_IMPORT_INTERVAL_SECS
}

fn default_recent_window_secs() -> u64 {
    DEFAULT_RECENT_WINDOW_SECS
}

fn default_backfill_days() -> u64 {
    DEFAULT_BACKFILL_DAYS
}

fn default_chunk_days() -> u64 {
    DEFAULT_CHUNK_DAYS
}

fn default_min_query_len() -> usize {
    DEFAULT_MIN_QUERY_LEN
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

pub fn base_path() -> String {
    std::env::var("RECALL_BASE_PATH").unwrap_or_else(|_| {
        format!(
            "{}/.local/share/recall",
            homedir::my_home()
                .expect("couldnt find home dir")
                .expect("couldnt find home dir")
                .to_string_lossy()
        )
    })
}

impl Config {
    fn validate(&mut self) {
        if self.import_interval_secs == 0 {
            panic!("import_interval_secs must be greater than 0");
        }
        if self.recent_window_secs == 0 {
            panic!("recent_window_secs must be greater than 0");
        }
        if self.chunk_days == 0 {
            panic!("chunk_days must be greater than 0");
        }
        if self.backfill_days < self.chunk_days {
            panic!("backfill_days must be at least chunk_days");
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            panic!("listen_addr is not a valid socket address");
        }
    }

    pub fn load() -> Self {
        Self::load_with(&base_path())
    }

    pub fn load_with(base_path: &str) -> Self {
        let store = BackendLocal::new(base_path).expect("couldnt create config dir");

        // create new if does not exist
        if !store.exists("config.yaml") {
            store
                .write(
                    "config.yaml",
                    serde_yml::to_string(&Self::default()).unwrap().as_bytes(),
                )
                .expect("couldnt write default config");
        }

        let config_str = String::from_utf8(store.read("config.yaml").expect("couldnt read config"))
            .expect("config file is not valid utf8");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.base_path = base_path.to_string();

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save();
        }

        config
    }

    pub fn save(&self) {
        let store = BackendLocal::new(&self.base_path).expect("couldnt create config dir");

        let config_str = serde_yml::to_string(&self).unwrap();
        store
            .write("config.yaml", config_str.as_bytes())
            .expect("couldnt write config");
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}
