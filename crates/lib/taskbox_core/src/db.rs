//! Ephemeral PostgreSQL instances.
//!
//! Spins up a throwaway PostgreSQL server (`initdb` + `pg_ctl`) in a
//! temporary directory, for integration tests that need a real database.
//! Data is removed when the instance is dropped.

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::PgPool;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;

/// Database name created inside each ephemeral instance.
const DATABASE_NAME: &str = "taskbox";

/// Maximum time to wait for PostgreSQL to become ready.
const PG_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval when waiting for PostgreSQL readiness.
const PG_READY_POLL: Duration = Duration::from_millis(200);

/// Errors that can occur while managing an ephemeral instance.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("PostgreSQL command failed: {0}")]
    Command(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pg_config not found on PATH")]
    PgConfigNotFound,

    #[error("PostgreSQL not ready after {0:?}")]
    ReadyTimeout(Duration),
}

/// Result type for ephemeral database operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// A running throwaway PostgreSQL server.
///
/// The data directory lives inside a tempdir held by this struct, so the
/// on-disk state disappears once the value is dropped. Call [`stop`] for a
/// graceful shutdown first; otherwise the server is left to die with the
/// removed directory.
///
/// [`stop`]: EphemeralPostgres::stop
pub struct EphemeralPostgres {
    bin_dir: PathBuf,
    port: u16,
    running: bool,
    tempdir: tempfile::TempDir,
}

impl EphemeralPostgres {
    /// Check whether PostgreSQL binaries are available on this machine.
    ///
    /// Tests use this to skip cleanly instead of failing on hosts without
    /// a PostgreSQL installation.
    pub async fn available() -> bool {
        pg_bin_dir().await.is_ok()
    }

    /// Initialize and start a fresh instance on a free ephemeral port.
    pub async fn start() -> Result<Self> {
        let bin_dir = pg_bin_dir().await?;
        let tempdir = tempfile::tempdir()?;
        let port = find_free_port()?;

        let instance = Self {
            bin_dir,
            port,
            running: false,
            tempdir,
        };

        instance.run_initdb().await?;
        instance.run_pg_ctl_start().await?;

        let mut instance = instance;
        instance.running = true;
        instance.wait_for_ready().await?;
        instance.create_database().await?;

        log::info!(
            "ephemeral PostgreSQL ready at {}",
            instance.connection_url()
        );
        Ok(instance)
    }

    /// Connection URL for the instance's application database.
    pub fn connection_url(&self) -> String {
        format!("postgresql://localhost:{}/{}", self.port, DATABASE_NAME)
    }

    /// Stop the server gracefully.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }

        let output = Command::new(self.bin_dir.join("pg_ctl"))
            .arg("-D")
            .arg(self.data_dir())
            .arg("-m")
            .arg("fast")
            .arg("stop")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("pg_ctl stop failed: {stderr}")));
        }

        self.running = false;
        Ok(())
    }

    fn data_dir(&self) -> PathBuf {
        self.tempdir.path().join("pgdata")
    }

    async fn run_initdb(&self) -> Result<()> {
        let output = Command::new(self.bin_dir.join("initdb"))
            .arg("-D")
            .arg(self.data_dir())
            .arg("--no-locale")
            .arg("--encoding=UTF8")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("initdb failed: {stderr}")));
        }
        Ok(())
    }

    async fn run_pg_ctl_start(&self) -> Result<()> {
        // Unix sockets go into the data dir so no system-wide path is touched.
        let port_opt = format!(
            "-p {} -k {} -h localhost",
            self.port,
            self.data_dir().display()
        );
        let logfile = self.data_dir().join("postgresql.log");

        let output = Command::new(self.bin_dir.join("pg_ctl"))
            .arg("-D")
            .arg(self.data_dir())
            .arg("-o")
            .arg(&port_opt)
            .arg("-l")
            .arg(&logfile)
            .arg("start")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("pg_ctl start failed: {stderr}")));
        }
        Ok(())
    }

    /// Wait for the server to answer `pg_isready`.
    async fn wait_for_ready(&self) -> Result<()> {
        let pg_isready = self.bin_dir.join("pg_isready");
        let deadline = tokio::time::Instant::now() + PG_READY_TIMEOUT;

        loop {
            let output = Command::new(&pg_isready)
                .arg("-p")
                .arg(self.port.to_string())
                .arg("-h")
                .arg("localhost")
                .output()
                .await?;

            if output.status.success() {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(DbError::ReadyTimeout(PG_READY_TIMEOUT));
            }

            sleep(PG_READY_POLL).await;
        }
    }

    /// Create the application database.
    async fn create_database(&self) -> Result<()> {
        let maintenance_url = format!("postgresql://localhost:{}/postgres", self.port);
        let pool = PgPool::connect(&maintenance_url).await?;

        // CREATE DATABASE cannot use bind parameters
        let sql = format!("CREATE DATABASE \"{DATABASE_NAME}\"");
        sqlx::query(&sql).execute(&pool).await?;

        pool.close().await;
        Ok(())
    }
}

/// Locate the PG bin directory via `pg_config --bindir` on PATH.
async fn pg_bin_dir() -> Result<PathBuf> {
    let output = Command::new("pg_config")
        .arg("--bindir")
        .output()
        .await
        .map_err(|_| DbError::PgConfigNotFound)?;

    if !output.status.success() {
        return Err(DbError::PgConfigNotFound);
    }

    let bin_dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(PathBuf::from(bin_dir))
}

/// Find a free ephemeral port by binding to port 0.
fn find_free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    Ok(port)
}
