use sqlx::mysql::MySqlConnectOptions;

/// Rows per `INSERT IGNORE` round trip
pub const BATCH_SIZE: usize = 1000;

/// Placeholders bound per inserted row (name, sex, createdAt, updatedAt)
pub const BINDS_PER_ROW: usize = 4;

/// MySQL prepared statements take at most 65535 placeholders
pub const MAX_BATCH_SIZE: usize = u16::MAX as usize / BINDS_PER_ROW;

/// Default location of the downloaded dataset (overridden by `CSV_DOWNLOAD_PATH`)
pub const DEFAULT_CSV_PATH: &str = "./data/babyNamesUSYOB-full.csv";

/// Where the dataset is published; logged when a local copy is used
pub const DATASET_URL: &str =
    "https://www.kaggle.com/datasets/thedevastator/us-baby-names-by-year-of-birth";
pub const DATASET_LICENSE: &str = "CC0-1.0";

/// Table holding persisted names
pub const NAMES_TABLE: &str = "BabyNames";

/// Max length of the `name` column
pub const NAME_MAX_LEN: usize = 128;

/// Header aliases tried in order for the name field
pub const NAME_ALIASES: &[&str] = &["Name", "name", "ChildName", "child_name", "babyName"];

/// Header aliases tried in order for the sex field
pub const SEX_ALIASES: &[&str] = &["Sex", "sex", "Gender", "gender"];

pub const CRM_CONTACTS_URL: &str = "https://api.hubapi.com/crm/v3/objects/contacts";

/// Stored rows forwarded to the CRM per push
pub const CRM_PUSH_LIMIT: usize = 100;

/// Per-request timeout for CRM calls
pub const CRM_TIMEOUT_SECS: u64 = 30;

/// Stored rows printed by `sample`
pub const SAMPLE_LIMIT: usize = 50;

pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_NAME: &str = "babynames_db";

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            username: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            database: DEFAULT_DB_NAME.to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let opts = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.database);
        if self.password.is_empty() {
            opts
        } else {
            opts.password(&self.password)
        }
    }

    /// `host:port/database`, safe to log
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}
