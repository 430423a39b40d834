//! Superuser, secret-key and AWS credential questions

use super::Session;
use crate::config::ConfigDocument;
use crate::error::CoreError;
use crate::probes::AwsCredentials;
use crate::prompt::{ask_password, ask_validated, validate};
use anyhow::Result;

/// External validation is attempted at most this many times per session.
const AWS_VALIDATION_ATTEMPTS: u32 = 3;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let admin = ask_validated(
        session.prompter,
        "Superuser name",
        &doc.get_str("admin_username"),
        validate::identifier,
    )?;
    doc.set_str("admin_username", admin);

    let password = ask_password(
        session.prompter,
        "Superuser password",
        &doc.get_str("admin_password"),
    )?;
    doc.set_str("admin_password", password);

    if doc.get_bool("advanced") {
        let secret = ask_validated(
            session.prompter,
            "API secret key (min 24 characters)",
            &doc.get_str("api_secret_key"),
            |raw| {
                if raw.len() >= 24 {
                    Ok(raw.to_string())
                } else {
                    Err("The secret key must be at least 24 characters".to_string())
                }
            },
        )?;
        doc.set_str("api_secret_key", secret);
    }

    aws(doc, session)?;

    if doc.get_bool("advanced") {
        let celery = session.prompter.confirm(
            "Run asynchronous task workers (Celery)?",
            doc.get_bool("use_celery"),
        )?;
        doc.set_bool("use_celery", celery);
    }

    Ok(())
}

/// AWS backup storage. Validation respects a hard budget of three attempts:
/// an attempt with any blank field counts against the budget without a
/// network call, and exhausting the budget is fatal.
fn aws(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let use_aws = session
        .prompter
        .confirm("Store backups on AWS S3?", doc.get_bool("use_aws"))?;
    doc.set_bool("use_aws", use_aws);

    if !use_aws {
        doc.set_str("aws_access_key_id", "");
        doc.set_str("aws_secret_access_key", "");
        doc.set_str("aws_region", "");
        doc.set_str("aws_bucket_name", "");
        doc.set_bool("aws_credentials_valid", false);
        return Ok(());
    }

    for _attempt in 0..AWS_VALIDATION_ATTEMPTS {
        let credentials = ask_aws_fields(doc, session)?;

        let validate_now = session
            .prompter
            .confirm("Validate the AWS credentials now?", true)?;
        if !validate_now {
            // Accepted without verification.
            store_aws(doc, &credentials, false);
            return Ok(());
        }

        if credentials.any_blank() {
            session
                .prompter
                .note_error("All four AWS fields are required for validation")?;
            continue;
        }

        match session.aws_validator.validate(&credentials) {
            Ok(true) => {
                store_aws(doc, &credentials, true);
                return Ok(());
            }
            Ok(false) => {
                session
                    .prompter
                    .note_error("AWS rejected the credentials")?;
            }
            Err(e) => {
                session
                    .prompter
                    .note_error(&format!("Credential validation failed: {}", e))?;
            }
        }
    }

    doc.set_bool("aws_credentials_valid", false);
    Err(CoreError::Credential(format!(
        "AWS credentials could not be validated after {} attempts",
        AWS_VALIDATION_ATTEMPTS
    ))
    .into())
}

fn ask_aws_fields(doc: &mut ConfigDocument, session: &mut Session) -> Result<AwsCredentials> {
    let pass = |raw: &str| Ok(raw.to_string());
    Ok(AwsCredentials {
        access_key_id: ask_validated(
            session.prompter,
            "AWS access key ID",
            &doc.get_str("aws_access_key_id"),
            pass,
        )?,
        secret_access_key: ask_validated(
            session.prompter,
            "AWS secret access key",
            &doc.get_str("aws_secret_access_key"),
            pass,
        )?,
        region: ask_validated(
            session.prompter,
            "AWS region",
            &doc.get_str("aws_region"),
            pass,
        )?,
        bucket_name: ask_validated(
            session.prompter,
            "S3 bucket for backups",
            &doc.get_str("aws_bucket_name"),
            pass,
        )?,
    })
}

fn store_aws(doc: &mut ConfigDocument, credentials: &AwsCredentials, valid: bool) {
    doc.set_str("aws_access_key_id", &credentials.access_key_id);
    doc.set_str("aws_secret_access_key", &credentials.secret_access_key);
    doc.set_str("aws_region", &credentials.region);
    doc.set_str("aws_bucket_name", &credentials.bucket_name);
    doc.set_bool("aws_credentials_valid", valid);
}
