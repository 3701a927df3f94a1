//! Response bodies shaped like the help center API.
#![allow(dead_code)]

pub const FIVE_ARTICLES_JSON: &str = r#"{
    "articles": [
        {
            "id": "101",
            "title": "Getting started",
            "summary": "Set up your account",
            "content": "Create an account, then verify your email address.",
            "lastUpdatedTimestamp": 1700000100000
        },
        {
            "id": "102",
            "title": "Resetting your password",
            "summary": "Forgot your password?",
            "content": "Use the reset link on the sign-in page.",
            "lastUpdatedTimestamp": 1700000500000
        },
        {
            "id": "103",
            "title": "Billing and invoices",
            "summary": "Where to find invoices",
            "content": "Invoices are listed under Settings > Billing.",
            "lastUpdatedTimestamp": 1700000300000
        },
        {
            "id": "104",
            "title": "Two-factor authentication",
            "summary": "Protect your account",
            "content": "Enable 2FA from the security page.",
            "lastUpdatedTimestamp": 1700000400000
        },
        {
            "id": "105",
            "title": "Deleting your account",
            "summary": "Close your account for good",
            "content": "Contact support to delete your account.",
            "lastUpdatedTimestamp": 1700000200000
        }
    ]
}"#;

/// Ids of `FIVE_ARTICLES_JSON`, newest first.
pub const FIVE_ARTICLES_ORDER: [&str; 5] = ["102", "104", "103", "105", "101"];

pub const ARTICLE_DETAIL_JSON: &str = r#"{
    "article": {
        "id": "102",
        "title": "Resetting your password",
        "summary": "Forgot your password?",
        "content": "Use the reset link on the sign-in page. The link expires after one hour.",
        "lastUpdatedTimestamp": 1700000600000
    }
}"#;

pub const BACKEND_ERROR_JSON: &str = r#"{
    "errorCode": "RATE_LIMITED",
    "errorTitle": "Too Many Requests",
    "errorMessage": "Slow down and try again in a minute."
}"#;

pub const MALFORMED_JSON: &str = r#"{ "articles": [ { "id": "1", "title": "#;
