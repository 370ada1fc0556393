//! CLI command runners.
//!
//! Each command performs one engine call, prints the result and returns
//! the process exit code. Domain failures carry their [`ErrorCode`];
//! `main.rs` turns a [`ClientError`] into the exit status.

mod ansi;
mod format;

use std::future::Future;
use std::io::Write;

use tokio_util::sync::CancellationToken;

pub use format::OutputOptions;

use crate::cli::{Command, ContentTypeArg};
use crate::history::identifier::IdentifierParseError;
use crate::history::{
    describe_item, ClipboardError, ErrorCode, HistoryEngine, HistoryError, Identifier,
    PinnedItemProvider,
};
use crate::native::{HistoryEntry, LiveClipboard, RoamingHistory, SetContentStatus};

pub const LIVE_VALUE_ABSENT: &str = "Clipboard does not contain the specified content type";

/// Exit code for failures outside the domain taxonomy.
const GENERIC_FAILURE: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Parse(#[from] IdentifierParseError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    fn domain(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::History(HistoryError::Domain(ClipboardError::new(code, message)))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(_) => ErrorCode::ParseError.code(),
            Self::History(e) => e.error_code().map_or(GENERIC_FAILURE, ErrorCode::code),
            Self::Io(_) => GENERIC_FAILURE,
        }
    }
}

/// Run `command` against `engine`, writing values to `out`.
///
/// Returns the exit code for a successful run: the number of entries for
/// `list`, zero otherwise.
pub async fn run<R, L, P, W>(
    engine: &HistoryEngine<R, L, P>,
    command: Command,
    output: &OutputOptions,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<i32, ClientError>
where
    R: RoamingHistory,
    L: LiveClipboard,
    P: PinnedItemProvider,
    W: Write,
{
    match command {
        Command::List {
            types,
            pinned,
            id,
            null,
        } => {
            let content_type = ContentTypeArg::combine(&types);
            let items = engine.list_history(content_type, pinned, cancel).await?;
            let separator = if null { b'\0' } else { b'\n' };
            for entry in &items {
                let label = if id {
                    entry.item.id().to_string()
                } else {
                    entry.index.to_string()
                };
                let value = describe_item(&entry.item, content_type).map_err(HistoryError::from)?;
                format::write_entry(out, &label, &output.render(&value), separator)?;
            }
            out.flush()?;
            Ok(i32::try_from(items.len()).unwrap_or(i32::MAX))
        }
        Command::Get {
            identifier: None,
            types,
            ..
        } => {
            let content_type = ContentTypeArg::combine(&types);
            let value = engine
                .get_live_value(content_type, cancel)
                .await?
                .ok_or_else(|| ClientError::domain(ErrorCode::NotFound, LIVE_VALUE_ABSENT))?;
            format::write_value(out, &output.render(&value))?;
            Ok(0)
        }
        Command::Get {
            identifier: Some(raw),
            types,
            set_current,
        } => {
            let identifier: Identifier = raw.parse()?;
            let content_type = ContentTypeArg::combine(&types);
            let item = engine.resolve_item(identifier, content_type, cancel).await?;
            if set_current {
                promote(engine, &item, cancel).await?;
            }
            let value = describe_item(&item, content_type).map_err(HistoryError::from)?;
            format::write_value(out, &output.render(&value))?;
            Ok(0)
        }
        Command::Pin { identifier } => {
            engine.pin(identifier.parse()?, cancel).await?;
            Ok(0)
        }
        Command::Unpin { identifier } => {
            engine.unpin(identifier.parse()?, cancel).await?;
            Ok(0)
        }
        Command::Status => {
            let settings = engine.settings(cancel).await?;
            format::write_settings(out, &settings)?;
            Ok(0)
        }
    }
}

/// Drive `command` until it finishes or `cancel` fires.
///
/// Cancellation wins even when the command is parked on an await, such as
/// the affinity worker's deadline.
pub async fn run_until_cancelled<F>(
    cancel: &CancellationToken,
    command: F,
) -> Result<i32, ClientError>
where
    F: Future<Output = Result<i32, ClientError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HistoryError::Cancelled.into()),
        result = command => result,
    }
}

async fn promote<R, L, P>(
    engine: &HistoryEngine<R, L, P>,
    item: &R::Item,
    cancel: &CancellationToken,
) -> Result<(), ClientError>
where
    R: RoamingHistory,
    L: LiveClipboard,
    P: PinnedItemProvider,
{
    let status = engine.set_as_current(item, cancel).await?;
    let code = match status {
        SetContentStatus::Success => return Ok(()),
        SetContentStatus::AccessDenied => ErrorCode::AccessDenied,
        SetContentStatus::ItemDeleted => ErrorCode::NotFound,
    };
    Err(ClientError::domain(
        code,
        format!("Failed to set clipboard content: {status}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LineEnding;
    use crate::history::EngineConfig;
    use crate::native::fake::{FakeClipboard, FakeHistory, FakeItem, FakePinned};

    const G: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

    type Engine = HistoryEngine<FakeHistory, FakeClipboard, FakePinned>;

    fn engine(history: FakeHistory, live: FakeClipboard) -> Engine {
        HistoryEngine::new(history, live, FakePinned::with_ids(&[G]), EngineConfig::default())
    }

    fn history() -> FakeHistory {
        FakeHistory::with_items(vec![
            FakeItem::with_text("aaaaaaaa-0000-4000-8000-000000000000", "first\r\nline"),
            FakeItem::image(G),
            FakeItem::with_text("cccccccc-0000-4000-8000-000000000000", "\x1b[31mred\x1b[0m"),
        ])
    }

    async fn exec_with(
        engine: &Engine,
        command: Command,
        output: OutputOptions,
    ) -> (Result<i32, ClientError>, String) {
        let mut out = Vec::new();
        let result = run(engine, command, &output, &CancellationToken::new(), &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    async fn exec(engine: &Engine, command: Command) -> (Result<i32, ClientError>, String) {
        exec_with(engine, command, OutputOptions::default()).await
    }

    fn list(types: &[ContentTypeArg]) -> Command {
        Command::List {
            types: types.to_vec(),
            pinned: false,
            id: false,
            null: false,
        }
    }

    fn get(identifier: Option<&str>, types: &[ContentTypeArg], set_current: bool) -> Command {
        Command::Get {
            identifier: identifier.map(str::to_string),
            types: types.to_vec(),
            set_current,
        }
    }

    #[tokio::test]
    async fn list_exit_code_is_count() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, out) = exec(&engine, list(&[ContentTypeArg::All])).await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(
            out,
            "0:first\r\nline\n1:[Unsupported Format: Image]\n2:\x1b[31mred\x1b[0m\n"
        );
    }

    #[tokio::test]
    async fn list_applies_output_options() {
        let engine = engine(history(), FakeClipboard::default());
        let options = OutputOptions {
            strip_ansi: true,
            line_ending: LineEnding::Lf,
        };
        let (result, out) = exec_with(&engine, list(&[ContentTypeArg::Text]), options).await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(out, "0:first\nline\n2:red\n");
    }

    #[tokio::test]
    async fn list_pinned_by_id_with_nul() {
        let engine = engine(history(), FakeClipboard::default());
        let command = Command::List {
            types: vec![ContentTypeArg::All],
            pinned: true,
            id: true,
            null: true,
        };
        let (result, out) = exec(&engine, command).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(out, format!("{G}:[Unsupported Format: Image]\0"));
    }

    #[tokio::test]
    async fn empty_listing_prints_nothing_and_exits_zero() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, out) = exec(&engine, list(&[ContentTypeArg::File])).await;
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn get_live_text() {
        let live = FakeClipboard {
            unicode: Some("live".into()),
            ..Default::default()
        };
        let engine = engine(history(), live);
        let (result, out) = exec(&engine, get(None, &[ContentTypeArg::Text], false)).await;
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "live");
    }

    #[tokio::test]
    async fn get_live_absent_is_not_found() {
        let live = FakeClipboard {
            unicode: Some("text only".into()),
            ..Default::default()
        };
        let engine = engine(history(), live);
        let (result, out) = exec(&engine, get(None, &[ContentTypeArg::Image], false)).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), LIVE_VALUE_ABSENT);
        assert_eq!(err.exit_code(), ErrorCode::NotFound.code());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn get_item_by_id() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, out) = exec(&engine, get(Some(G), &[ContentTypeArg::Image], false)).await;
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "[Unsupported Format: Image]");
    }

    #[tokio::test]
    async fn get_incompatible_item_exit_code() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, _) = exec(&engine, get(Some("1"), &[ContentTypeArg::Text], false)).await;
        assert_eq!(result.unwrap_err().exit_code(), -3);
    }

    #[tokio::test]
    async fn unparsable_identifier_is_parse_error() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, _) = exec(&engine, get(Some("newest"), &[ContentTypeArg::All], false)).await;
        assert_eq!(result.unwrap_err().exit_code(), ErrorCode::ParseError.code());
    }

    #[tokio::test]
    async fn set_current_promotes_item() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, out) = exec(&engine, get(Some("0"), &[ContentTypeArg::Text], true)).await;
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "first\r\nline");
        assert_eq!(
            *engine_promoted(&engine),
            vec!["aaaaaaaa-0000-4000-8000-000000000000".to_string()]
        );
    }

    #[tokio::test]
    async fn set_current_deleted_item_is_not_found() {
        let mut history = history();
        history.set_status = SetContentStatus::ItemDeleted;
        let engine = engine(history, FakeClipboard::default());
        let (result, out) = exec(&engine, get(Some("0"), &[ContentTypeArg::All], true)).await;
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), ErrorCode::NotFound.code());
        assert!(err.to_string().contains("ItemDeleted"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn set_current_access_denied() {
        let mut history = history();
        history.set_status = SetContentStatus::AccessDenied;
        let engine = engine(history, FakeClipboard::default());
        let (result, _) = exec(&engine, get(Some("0"), &[ContentTypeArg::All], true)).await;
        assert_eq!(result.unwrap_err().exit_code(), ErrorCode::AccessDenied.code());
    }

    #[tokio::test]
    async fn disabled_history_exit_code() {
        let engine = engine(
            FakeHistory::with_status(crate::native::HistoryStatus::ClipboardHistoryDisabled),
            FakeClipboard::default(),
        );
        let (result, _) = exec(&engine, list(&[ContentTypeArg::All])).await;
        assert_eq!(result.unwrap_err().exit_code(), -4);
    }

    #[tokio::test]
    async fn timeout_exits_generic_failure() {
        let live = FakeClipboard {
            unicode: Some("slow".into()),
            delay: Some(std::time::Duration::from_secs(2)),
            ..Default::default()
        };
        let engine = HistoryEngine::new(
            history(),
            live,
            FakePinned::default(),
            EngineConfig {
                live_timeout: std::time::Duration::from_millis(50),
            },
        );
        let (result, _) = exec(&engine, get(None, &[ContentTypeArg::Text], false)).await;
        let err = result.unwrap_err();
        assert!(matches!(err, ClientError::History(HistoryError::Timeout(_))));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn pin_then_unpin() {
        let engine = engine(history(), FakeClipboard::default());
        let pin = Command::Pin {
            identifier: "0".into(),
        };
        let (result, _) = exec(&engine, pin).await;
        assert_eq!(result.unwrap(), 0);

        let pinned = Command::List {
            types: vec![ContentTypeArg::All],
            pinned: true,
            id: false,
            null: false,
        };
        let (result, _) = exec(&engine, pinned.clone()).await;
        assert_eq!(result.unwrap(), 2);

        let unpin = Command::Unpin {
            identifier: G.into(),
        };
        let (result, _) = exec(&engine, unpin).await;
        assert_eq!(result.unwrap(), 0);
        let (result, out) = exec(&engine, pinned).await;
        assert_eq!(result.unwrap(), 1);
        assert!(out.starts_with("0:"));
    }

    #[tokio::test]
    async fn status_prints_settings() {
        let engine = engine(history(), FakeClipboard::default());
        let (result, out) = exec(&engine, Command::Status).await;
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "History: Enabled\nRoaming: Disabled\n");
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_stalled_command() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let stalled = std::future::pending::<Result<i32, ClientError>>();
        let err = run_until_cancelled(&cancel, stalled).await.unwrap_err();
        assert!(matches!(err, ClientError::History(HistoryError::Cancelled)));
        assert_eq!(err.exit_code(), GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn cancellation_stops_a_slow_live_read() {
        let live = FakeClipboard {
            unicode: Some("slow".into()),
            delay: Some(std::time::Duration::from_secs(2)),
            ..Default::default()
        };
        let engine = HistoryEngine::new(
            history(),
            live,
            FakePinned::default(),
            EngineConfig {
                live_timeout: std::time::Duration::from_secs(5),
            },
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let output = OutputOptions::default();
        let command = run(
            &engine,
            get(None, &[ContentTypeArg::Text], false),
            &output,
            &cancel,
            &mut out,
        );
        let err = run_until_cancelled(&cancel, command).await.unwrap_err();
        assert!(matches!(err, ClientError::History(HistoryError::Cancelled)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn completed_command_passes_through() {
        let cancel = CancellationToken::new();
        let result = run_until_cancelled(&cancel, async { Ok::<_, ClientError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    fn engine_promoted(engine: &Engine) -> std::sync::MutexGuard<'_, Vec<String>> {
        engine.history().promoted.lock().unwrap()
    }
}
