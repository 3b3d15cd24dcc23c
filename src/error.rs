use std::time::Duration;

use thiserror::Error;

use crate::model::ParseError;
use crate::render::RenderError;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Every way one analysis run can fail.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("analysis request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("backend returned HTTP {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },

    #[error(transparent)]
    Malformed(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AnalysisError {
    /// Notification text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout(_) => {
                "分析がタイムアウトしました。しばらく待ってから再試行してください。".to_string()
            }
            Self::Server { message, .. } => {
                format!("分析エラー: {}", message.as_deref().unwrap_or("不明なエラー"))
            }
            other => format!("エラーが発生しました: {other}"),
        }
    }

    /// Short machine-readable kind, used in the run log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Server { .. } => "server",
            Self::Malformed(_) => "malformed",
            Self::Render(_) => "render",
        }
    }

    /// Timeouts are network failures too.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_has_dedicated_message() {
        let err = AnalysisError::Timeout(Duration::from_secs(60));
        assert!(err.user_message().contains("タイムアウト"));
        assert!(err.is_network());
        assert_eq!(err.to_string(), "analysis request timed out after 60s");
    }

    #[test]
    fn server_error_prefers_backend_message() {
        let err = AnalysisError::Server {
            status: 400,
            message: Some("トピック数は2-10の間で指定してください".into()),
        };
        assert_eq!(
            err.user_message(),
            "分析エラー: トピック数は2-10の間で指定してください"
        );
    }

    #[test]
    fn server_error_without_message_is_generic() {
        let err = AnalysisError::Server {
            status: 502,
            message: None,
        };
        assert_eq!(err.user_message(), "分析エラー: 不明なエラー");
    }

    #[test]
    fn other_failures_use_generic_prefix() {
        let err = AnalysisError::Network("connection refused".into());
        assert_eq!(
            err.user_message(),
            "エラーが発生しました: network failure: connection refused"
        );
        assert_eq!(err.kind(), "network");
    }
}
