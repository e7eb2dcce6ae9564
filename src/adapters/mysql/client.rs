//! mysql CLI client
//!
//! Runs the schema size query in batch mode. The password is handed over
//! through `MYSQL_PWD` so it never shows up in the process list.

use crate::adapters::process::{CommandRunner, CommandSpec};
use crate::domain::{GatewayError, Instance};
use std::path::Path;
use std::sync::Arc;

/// CA bundle file name inside an instance's TLS directory
pub const SERVER_CA_FILE: &str = "server-ca.pem";
/// Client certificate file name inside an instance's TLS directory
pub const CLIENT_CERT_FILE: &str = "client-cert.pem";
/// Client key file name inside an instance's TLS directory
pub const CLIENT_KEY_FILE: &str = "client-key.pem";

/// Builds the size query excluding `excluded` schemas
pub fn size_query(excluded: &[String]) -> String {
    let mut query = String::from(
        "SELECT table_schema, SUM(data_length + index_length) / 1024 / 1024 AS size_mb \
         FROM information_schema.TABLES",
    );
    if !excluded.is_empty() {
        let list = excluded
            .iter()
            .map(|name| format!("'{}'", name.replace('\\', "\\\\").replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");
        query.push_str(&format!(" WHERE table_schema NOT IN ({list})"));
    }
    query.push_str(" GROUP BY table_schema ORDER BY size_mb ASC;");
    query
}

/// TLS client flags for a certificate directory
pub fn tls_args(dir: &Path) -> Vec<String> {
    vec![
        format!("--ssl-ca={}", dir.join(SERVER_CA_FILE).display()),
        format!("--ssl-cert={}", dir.join(CLIENT_CERT_FILE).display()),
        format!("--ssl-key={}", dir.join(CLIENT_KEY_FILE).display()),
    ]
}

/// Client for the `mysql` tool
#[derive(Clone)]
pub struct MysqlCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    query: String,
}

impl MysqlCli {
    /// Creates a client whose size listing skips `excluded` schemas
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        excluded: &[String],
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            query: size_query(excluded),
        }
    }

    /// Builds the command line for the size listing
    pub fn size_listing_command(&self, instance: &Instance) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.program).args([
            format!("-h{}", instance.host),
            format!("-u{}", instance.credentials.username),
            "-B".to_string(),
            "--silent".to_string(),
            "-N".to_string(),
        ]);
        if let Some(dir) = &instance.tls_dir {
            spec = spec.args(tls_args(dir));
        }
        spec.args(["-e".to_string(), self.query.clone()])
            .secret_env("MYSQL_PWD", instance.credentials.password.clone())
    }

    /// Runs the size listing and returns its raw output
    ///
    /// Diagnostics on stderr (e.g. the insecure-password warning) are appended
    /// after stdout, which the listing parser is required to tolerate.
    pub async fn size_listing(&self, instance: &Instance) -> Result<String, GatewayError> {
        let spec = self.size_listing_command(instance);
        let output = self.runner.run(&spec).await?.into_result(&self.program)?;
        if output.stderr.trim().is_empty() {
            Ok(output.stdout)
        } else {
            Ok(format!("{}\n{}", output.stdout, output.stderr))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::process::CommandOutput;
    use crate::config::schema::default_excluded_databases;
    use crate::config::secret_string;
    use crate::domain::{DbCredentials, InstanceId, StorageLocation};
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::path::PathBuf;

    struct Fixed(CommandOutput);

    #[async_trait]
    impl CommandRunner for Fixed {
        async fn run(&self, _spec: &CommandSpec) -> Result<CommandOutput, GatewayError> {
            Ok(self.0.clone())
        }
    }

    fn instance(tls_dir: Option<PathBuf>) -> Instance {
        Instance {
            id: InstanceId::new("i1").unwrap(),
            host: "10.0.0.5".to_string(),
            project: "proj".to_string(),
            storage: StorageLocation::new("b", "p").unwrap(),
            tls_dir,
            credentials: Arc::new(DbCredentials {
                username: "backup".to_string(),
                password: secret_string("hunter2".to_string()),
            }),
        }
    }

    fn client(output: CommandOutput) -> MysqlCli {
        MysqlCli::new(Arc::new(Fixed(output)), "mysql", &default_excluded_databases())
    }

    #[test]
    fn test_size_query_excludes_system_schemas() {
        let query = size_query(&default_excluded_databases());
        assert!(query.contains(
            "WHERE table_schema NOT IN ('mysql','information_schema','performance_schema','sys')"
        ));
        assert!(query.ends_with("GROUP BY table_schema ORDER BY size_mb ASC;"));
    }

    #[test]
    fn test_size_query_escapes_quotes() {
        let query = size_query(&["it's".to_string()]);
        assert!(query.contains("NOT IN ('it''s')"));
    }

    #[test]
    fn test_size_query_without_exclusions() {
        let query = size_query(&[]);
        assert!(!query.contains("WHERE"));
    }

    #[test]
    fn test_command_keeps_password_out_of_args() {
        let spec = client(CommandOutput::ok("")).size_listing_command(&instance(None));

        assert_eq!(spec.program, "mysql");
        assert_eq!(&spec.args[..5], ["-h10.0.0.5", "-ubackup", "-B", "--silent", "-N"]);
        assert!(spec.args.iter().all(|a| !a.contains("hunter2")));
        assert!(!spec.args.iter().any(|a| a.starts_with("--ssl")));
        let (key, value) = &spec.env[0];
        assert_eq!(key, "MYSQL_PWD");
        assert_eq!(value.expose_secret(), "hunter2");
    }

    #[test]
    fn test_command_with_tls() {
        let spec = client(CommandOutput::ok(""))
            .size_listing_command(&instance(Some(PathBuf::from("/ssl-certs/i1"))));

        assert!(spec.args.contains(&"--ssl-ca=/ssl-certs/i1/server-ca.pem".to_string()));
        assert!(spec.args.contains(&"--ssl-cert=/ssl-certs/i1/client-cert.pem".to_string()));
        assert!(spec.args.contains(&"--ssl-key=/ssl-certs/i1/client-key.pem".to_string()));
    }

    #[tokio::test]
    async fn test_size_listing_appends_diagnostics() {
        let output = CommandOutput {
            code: Some(0),
            stdout: "db1\t12.5\n".to_string(),
            stderr: "mysql: [Warning] Using a password on the command line interface can be insecure.\n"
                .to_string(),
        };
        let text = client(output).size_listing(&instance(None)).await.unwrap();
        assert!(text.starts_with("db1\t12.5"));
        assert!(text.contains("[Warning]"));
    }

    #[tokio::test]
    async fn test_size_listing_failure() {
        let err = client(CommandOutput::failed(1, "ERROR 2003 (HY000): Can't connect"))
            .size_listing(&instance(None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::CommandFailed { .. }));
    }
}
