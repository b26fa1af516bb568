use crate::types::OutputFormat;
use crate::views::Palette;
use anyhow::Result;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tally_index::Database;
use tally_runtime::Config;

const DB_FILE: &str = "tally.db";
const CONFIG_FILE: &str = "config.toml";

pub struct ExecutionContext {
    data_dir: PathBuf,
    db: OnceCell<Database>,
    config: OnceCell<Config>,
    pub format: OutputFormat,
    pub palette: Palette,
}

impl ExecutionContext {
    pub fn new(data_dir: PathBuf, format: OutputFormat) -> Self {
        Self {
            data_dir,
            db: OnceCell::new(),
            config: OnceCell::new(),
            format,
            palette: Palette::detect(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Shared connection for read-side commands.
    pub fn db(&self) -> Result<&Database> {
        self.db.get_or_try_init(|| self.open_db())
    }

    /// A fresh connection that can be handed to a sink thread.
    pub fn open_db(&self) -> Result<Database> {
        Ok(Database::open(&self.db_path())?)
    }

    pub fn config(&self) -> Result<&Config> {
        self.config
            .get_or_try_init(|| Ok(Config::load_from(&self.config_path())?))
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
