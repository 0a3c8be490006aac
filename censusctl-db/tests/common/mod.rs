//! Shared fixture for the MySQL integration tests
//!
//! Each test gets its own throwaway database on the server named by
//! `DATABASE_URL` (the user needs CREATE/DROP DATABASE).

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use censusctl_db::{CensusDb, NewApp, NewCompany, NewRelease, ValueLogging};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{ConnectOptions, Connection, MySqlConnection};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE companies (
        id INT AUTO_INCREMENT PRIMARY KEY,
        googleDevId VARCHAR(255) NULL,
        commonName VARCHAR(255) NOT NULL UNIQUE,
        type VARCHAR(32) NULL
    )"#,
    r#"CREATE TABLE apps (
        id INT AUTO_INCREMENT PRIMARY KEY,
        packageName VARCHAR(255) NOT NULL UNIQUE,
        commonName VARCHAR(255) NOT NULL,
        devCompanyId INT NOT NULL,
        productUrl VARCHAR(1024) NULL,
        timestampLastChecked BIGINT NOT NULL,
        iconUrl VARCHAR(1024) NULL,
        installCount BIGINT NOT NULL DEFAULT 0,
        runStatus INT NOT NULL DEFAULT 0,
        isFamily TINYINT(1) NOT NULL DEFAULT 0,
        priority INT NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE appReleases (
        id INT AUTO_INCREMENT PRIMARY KEY,
        appId INT NOT NULL,
        versionCode BIGINT NOT NULL,
        versionString VARCHAR(255) NOT NULL,
        timestampPublish BIGINT NOT NULL,
        timestampDownload BIGINT NULL,
        hasInAppPurchases TINYINT(1) NULL,
        hasAds TINYINT(1) NULL,
        socialNetworks TINYINT(1) NULL,
        tested TINYINT(1) NOT NULL DEFAULT 0,
        UNIQUE KEY app_version (appId, versionCode)
    )"#,
    r#"CREATE TABLE categories (
        id INT AUTO_INCREMENT PRIMARY KEY,
        categoryName VARCHAR(255) NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE appCategoriesMapping (
        appId INT NOT NULL,
        categoryId INT NOT NULL,
        PRIMARY KEY (appId, categoryId)
    )"#,
    r#"CREATE TABLE testPermissions (
        id INT AUTO_INCREMENT PRIMARY KEY,
        timestamp BIGINT NOT NULL,
        releaseId INT NOT NULL,
        permission VARCHAR(255) NOT NULL,
        isUsed TINYINT(1) NOT NULL DEFAULT 0,
        testerId VARCHAR(64) NULL,
        UNIQUE KEY release_permission (releaseId, permission)
    )"#,
    r#"CREATE TABLE testTransmissions (
        id INT AUTO_INCREMENT PRIMARY KEY,
        timestamp BIGINT NOT NULL,
        releaseId INT NOT NULL,
        domain VARCHAR(255) NULL,
        tlsSNI VARCHAR(255) NULL,
        ipAddress VARCHAR(64) NULL,
        port INT NULL,
        isTLS TINYINT(1) NOT NULL DEFAULT 0,
        dataType VARCHAR(64) NOT NULL,
        payload TEXT NULL,
        testerId VARCHAR(64) NULL,
        UNIQUE KEY release_transmission (releaseId, timestamp, dataType)
    )"#,
];

pub struct TestDb {
    pub db: CensusDb,
    name: String,
    server: MySqlConnectOptions,
}

impl TestDb {
    pub async fn new(label: &str) -> Self {
        Self::with_connections(label, 1).await
    }

    pub async fn with_connections(label: &str, max_connections: u32) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("censusctl_db=debug")
            .with_test_writer()
            .try_init();

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let server = MySqlConnectOptions::from_str(&url)
            .expect("invalid DATABASE_URL")
            .disable_statement_logging();

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let name = format!("censusctl_{}_{}_{}", label, std::process::id(), nanos);

        let mut admin = MySqlConnection::connect_with(&server).await.expect("connect failed");
        sqlx::query(&format!("CREATE DATABASE `{}`", name))
            .execute(&mut admin)
            .await
            .expect("create database failed");
        admin.close().await.ok();

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(server.clone().database(&name))
            .await
            .expect("pool creation failed");

        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&pool).await.expect("schema setup failed");
        }

        Self {
            db: CensusDb::from_pool(pool).with_value_logging(ValueLogging::Full),
            name,
            server,
        }
    }

    /// Company + app + one untested release. Returns (app id, release id).
    pub async fn seed_app(&self, package: &str, install_count: i64, priority: i64) -> (i64, i64) {
        let company = self
            .db
            .companies()
            .insert_company(&NewCompany::new(format!("{package} developer")))
            .await
            .unwrap();
        let app = self
            .db
            .apps()
            .insert_app(&NewApp {
                install_count,
                ..NewApp::new(company, package, package)
            })
            .await
            .unwrap();
        self.set_priority(app, priority).await;

        let release = self
            .db
            .releases()
            .insert_app_release(&NewRelease::new(app, 100, "1.0.0", 1_600_000_000))
            .await
            .unwrap();

        (app, release)
    }

    pub async fn set_priority(&self, app_id: i64, priority: i64) {
        sqlx::query("UPDATE apps SET priority = ? WHERE id = ?")
            .bind(priority)
            .bind(app_id)
            .execute(self.db.pool())
            .await
            .unwrap();
    }

    pub async fn run_status(&self, package: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT CAST(runStatus AS SIGNED) FROM apps WHERE packageName = ?")
            .bind(package)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn count(&self, sql: &str, id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn teardown(self) {
        self.db.close().await;

        let mut admin = MySqlConnection::connect_with(&self.server).await.expect("connect failed");
        sqlx::query(&format!("DROP DATABASE `{}`", self.name))
            .execute(&mut admin)
            .await
            .expect("drop database failed");
        admin.close().await.ok();
    }
}
