use async_trait::async_trait;
use tracing::info;

use super::{Agent, TaskContext, TaskResult};
use crate::error::Result;
use crate::rules::SECURITY_RULES;
use crate::types::Severity;

/// Vulnerability scan: injection, leaked credentials, unchecked input and I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityAgent;

#[async_trait]
impl Agent for SecurityAgent {
    fn name(&self) -> &'static str {
        "Security"
    }

    async fn execute_task(&self, task: &str, ctx: &TaskContext) -> Result<TaskResult> {
        info!("security scan: {task}");
        let violations = ctx.scan(SECURITY_RULES);
        let mut result = TaskResult::from_violations(violations, String::new());
        result.details = format!(
            "Vulnerabilities: P0={}, P1={}, P2={}",
            result.count(Severity::P0),
            result.count(Severity::P1),
            result.count(Severity::P2)
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use std::fs;

    #[tokio::test]
    async fn leaks_and_unchecked_calls_are_reported() {
        let d = tempfile::tempdir().unwrap();
        fs::create_dir_all(d.path().join("lib")).unwrap();
        fs::write(
            d.path().join("lib/auth.ts"),
            "export async function login(password: string) {\n\
             \x20 console.log('login', password);\n\
             \x20 const res = await fetch('/api/login');\n\
             \x20 return res.json();\n\
             }\n",
        )
        .unwrap();
        fs::write(d.path().join("lib/env.ts"), "export const k = process.env.NEXT_PUBLIC_API_SECRET;\n")
            .unwrap();

        let ctx = TaskContext::discover(d.path(), AuditConfig::default());
        let result = SecurityAgent.execute_task("scan", &ctx).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.details, "Vulnerabilities: P0=2, P1=1, P2=0");
        assert!(result.issues.iter().any(|i| i.starts_with("lib/auth.ts:2")));
        assert!(result.warnings[0].starts_with("lib/auth.ts:3"));
    }

    #[tokio::test]
    async fn clean_project_succeeds() {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("a.ts"), "export const x = 1;\n").unwrap();
        let ctx = TaskContext::discover(d.path(), AuditConfig::default());
        let result = SecurityAgent.execute_task("scan", &ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.details, "Vulnerabilities: P0=0, P1=0, P2=0");
    }
}
