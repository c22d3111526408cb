//! Playwright-backed [`SessionDriver`].
//!
//! Rust owns the state machine; the browser work happens in a
//! generated Node runner script supervised as a child process. The
//! runner launches one headless Chromium, injects the session cookies
//! before any navigation, then serves line-delimited JSON commands on
//! stdin until told to close. Protocol lines are prefixed with a
//! marker so stray output never corrupts a payload.

use crate::cookie::{CookieRecord, parse_cookie_string};
use crate::driver::{Delivery, SessionDriver};
use crate::session::Pacing;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use outflow_models::ReplyRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::debug;

const DRIVER_MARKER: &str = "__OUTFLOW_DRIVER__=";
const COMPOSER_TRIGGER_SELECTOR: &str = "button:has-text(\"Message\")";
const THREAD_ITEM_SELECTOR: &str = "div.c-virtual_list__item";
const REPLY_MARKER_TOKEN: &str = "replied";
const CLIENT_URL: &str = "https://app.slack.com/client";
const LAUNCH_TIMEOUT_SECS: u64 = 60;
const COMMAND_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeProbe {
    pub node_available: bool,
    pub node_version: Option<String>,
    pub playwright_package_available: bool,
    pub chromium_cache_detected: bool,
    pub ready: bool,
    pub notes: Vec<String>,
}

impl RuntimeProbe {
    fn empty() -> Self {
        Self {
            node_available: false,
            node_version: None,
            playwright_package_available: false,
            chromium_cache_detected: false,
            ready: false,
            notes: Vec::new(),
        }
    }
}

/// Checks whether the Node/Playwright runtime the driver depends on is
/// usable on this host.
pub async fn probe_runtime() -> Result<RuntimeProbe> {
    let mut probe = RuntimeProbe::empty();

    let node_probe = run_command_capture("node", &["--version".to_string()], 10).await;
    if let Ok(output) = node_probe
        && output.exit_code == 0
    {
        probe.node_available = true;
        probe.node_version = Some(output.stdout.trim().to_string());
    }

    if probe.node_available {
        let playwright_probe = run_command_capture(
            "node",
            &[
                "--input-type=module".to_string(),
                "-e".to_string(),
                "import('playwright').then(() => process.exit(0)).catch(() => process.exit(1));"
                    .to_string(),
            ],
            15,
        )
        .await;
        probe.playwright_package_available = playwright_probe
            .map(|output| output.exit_code == 0)
            .unwrap_or(false);
    }

    probe.chromium_cache_detected = detect_chromium_cache();
    probe.ready = probe.node_available && probe.playwright_package_available;

    if !probe.node_available {
        probe
            .notes
            .push("Node.js not found. Install Node.js 20+ to enable the session driver.".to_string());
    }

    if probe.node_available && !probe.playwright_package_available {
        probe
            .notes
            .push("Playwright npm package not found. Run: npm i -D playwright".to_string());
    }

    if probe.ready && !probe.chromium_cache_detected {
        probe.notes.push(
            "Chromium browser binary not found in Playwright cache. Run: npx playwright install chromium"
                .to_string(),
        );
    }

    Ok(probe)
}

/// A live authenticated browsing session backed by a Node child
/// process. One instance serves exactly one operation; `kill_on_drop`
/// guarantees the browser is reaped even if `close` is never reached.
pub struct PlaywrightDriver {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    command_timeout: Duration,
    // Keeps the generated runner script alive for the child's lifetime.
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Spawns the runner, injects the parsed cookies and waits for the
    /// browser to come up. Failure here is fatal to the whole
    /// invocation; an unparseable cookie string is not a failure, it
    /// just yields an unauthenticated session.
    pub async fn launch(cookie: &str, pacing: &Pacing) -> Result<Self> {
        let cookies = parse_cookie_string(cookie);
        let script = build_session_runner(&cookies, pacing)?;

        let script_dir = tempfile::Builder::new()
            .prefix("outflow-session-")
            .tempdir()?;
        let script_path = script_dir.path().join("runner.mjs");
        std::fs::write(&script_path, script)?;

        let mut child = Command::new("node")
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn node for the session runner")?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("session runner has no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("session runner has no stdout"))?;

        let mut driver = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            command_timeout: Duration::from_secs(COMMAND_TIMEOUT_SECS),
            _script_dir: script_dir,
        };

        let ready = driver
            .read_payload(Duration::from_secs(LAUNCH_TIMEOUT_SECS))
            .await
            .context("session runner did not come up")?;
        if ready.get("ready").and_then(Value::as_bool) != Some(true) {
            bail!("session runner reported an unexpected launch payload");
        }

        Ok(driver)
    }

    async fn request(&mut self, request: Value) -> Result<Value> {
        let mut line = request.to_string();
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        self.read_payload(self.command_timeout).await
    }

    /// Reads stdout lines until a marker-prefixed payload arrives.
    /// A payload with `ok: false` becomes the command's error.
    async fn read_payload(&mut self, wait: Duration) -> Result<Value> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let line = match timeout(remaining, self.stdout.next_line()).await {
                Ok(result) => result?,
                Err(_) => bail!("session runner timed out after {:?}", wait),
            };
            let Some(line) = line else {
                bail!("session runner exited unexpectedly");
            };

            let Some(payload) = parse_driver_line(&line) else {
                debug!(line = %line, "ignoring non-protocol runner output");
                continue;
            };

            if payload.get("ok").and_then(Value::as_bool) == Some(true) {
                return Ok(payload);
            }
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("session runner reported an unknown error");
            bail!("{message}");
        }
    }
}

#[async_trait]
impl SessionDriver for PlaywrightDriver {
    async fn deliver(&mut self, profile_url: &str, message: &str) -> Result<Delivery> {
        let payload = self
            .request(json!({
                "cmd": "deliver",
                "url": profile_url,
                "message": message,
            }))
            .await?;

        match payload.get("delivery").and_then(Value::as_str) {
            Some("sent") => Ok(Delivery::Sent),
            Some("composer_not_found") => Ok(Delivery::ComposerNotFound),
            other => bail!("session runner returned an unknown delivery: {other:?}"),
        }
    }

    async fn scan_replies(&mut self, cap: usize) -> Result<Vec<ReplyRecord>> {
        let payload = self
            .request(json!({ "cmd": "scan_replies", "cap": cap }))
            .await?;
        let replies = payload
            .get("replies")
            .cloned()
            .ok_or_else(|| anyhow!("session runner returned no replies field"))?;
        Ok(serde_json::from_value(replies)?)
    }

    async fn close(&mut self) -> Result<()> {
        // A broken pipe here means the runner already went away; the
        // kill below still reaps it.
        let _ = self.stdin.write_all(b"{\"cmd\":\"close\"}\n").await;
        let _ = self.stdin.flush().await;

        match timeout(Duration::from_secs(10), self.child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                self.child.start_kill()?;
                self.child.wait().await?;
            }
        }
        Ok(())
    }
}

fn parse_driver_line(line: &str) -> Option<Value> {
    let rest = line.strip_prefix(DRIVER_MARKER)?;
    serde_json::from_str(rest.trim()).ok()
}

/// Emits the Node runner for one authenticated session: launch
/// Chromium, add cookies, open a page, then serve commands from stdin.
fn build_session_runner(cookies: &[CookieRecord], pacing: &Pacing) -> Result<String> {
    let cookies_literal = serde_json::to_string(cookies)?;
    let pacing_literal = serde_json::to_string(pacing)?;

    let mut script = String::new();
    script.push_str("import readline from 'node:readline';\n\n");
    script.push_str(&format!("const MARKER = '{}';\n", DRIVER_MARKER));
    script.push_str(&format!("const cookies = {};\n", cookies_literal));
    script.push_str(&format!("const pacing = {};\n", pacing_literal));
    script.push_str(&format!("const CLIENT_URL = '{}';\n", CLIENT_URL));
    script.push_str(&format!(
        "const REPLY_TOKEN = '{}';\n\n",
        REPLY_MARKER_TOKEN
    ));
    script.push_str("const emit = (value) => {\n");
    script.push_str("  process.stdout.write(`${MARKER}${JSON.stringify(value)}\\n`);\n");
    script.push_str("};\n");
    script.push_str("const describe = (error) => (error && error.message ? error.message : String(error));\n\n");

    script.push_str("let chromium;\n");
    script.push_str("try {\n");
    script.push_str("  ({ chromium } = await import('playwright'));\n");
    script.push_str("} catch (error) {\n");
    script.push_str("  emit({ ok: false, error: describe(error) });\n");
    script.push_str("  process.exit(1);\n");
    script.push_str("}\n\n");

    script.push_str("let browser;\n");
    script.push_str("let context;\n");
    script.push_str("let page;\n");
    script.push_str("try {\n");
    script.push_str("  browser = await chromium.launch({ headless: true });\n");
    script.push_str("  context = await browser.newContext();\n");
    script.push_str("  await context.addCookies(cookies);\n");
    script.push_str("  page = await context.newPage();\n");
    script.push_str("  emit({ ok: true, ready: true });\n");
    script.push_str("} catch (error) {\n");
    script.push_str("  emit({ ok: false, error: describe(error) });\n");
    script.push_str("  process.exit(1);\n");
    script.push_str("}\n\n");

    script.push_str("async function deliver(url, message) {\n");
    script.push_str("  await page.goto(url);\n");
    script.push_str("  await page.waitForTimeout(pacing.profile_settle_ms);\n");
    script.push_str(&format!(
        "  const trigger = await page.$('{}');\n",
        COMPOSER_TRIGGER_SELECTOR
    ));
    script.push_str("  if (!trigger) {\n");
    script.push_str("    return { ok: true, delivery: 'composer_not_found' };\n");
    script.push_str("  }\n");
    script.push_str("  await trigger.click();\n");
    script.push_str("  await page.waitForTimeout(pacing.composer_settle_ms);\n");
    // Submission relies on input focus following the activated trigger.
    script.push_str("  await page.keyboard.type(message);\n");
    script.push_str("  await page.keyboard.press('Enter');\n");
    script.push_str("  return { ok: true, delivery: 'sent' };\n");
    script.push_str("}\n\n");

    script.push_str("async function scanReplies(cap) {\n");
    script.push_str("  await page.goto(CLIENT_URL);\n");
    script.push_str("  await page.waitForTimeout(pacing.replies_settle_ms);\n");
    script.push_str(&format!(
        "  const items = await page.$$('{}');\n",
        THREAD_ITEM_SELECTOR
    ));
    script.push_str("  const replies = [];\n");
    script.push_str("  for (const item of items.slice(0, cap)) {\n");
    script.push_str("    try {\n");
    script.push_str("      const content = await item.innerText();\n");
    script.push_str("      if (content.toLowerCase().includes(REPLY_TOKEN)) {\n");
    script.push_str("        replies.push({ message: content });\n");
    script.push_str("      }\n");
    script.push_str("    } catch {\n");
    script.push_str("      continue;\n");
    script.push_str("    }\n");
    script.push_str("  }\n");
    script.push_str("  return { ok: true, replies };\n");
    script.push_str("}\n\n");

    script.push_str("const rl = readline.createInterface({ input: process.stdin });\n");
    script.push_str("for await (const line of rl) {\n");
    script.push_str("  let request;\n");
    script.push_str("  try {\n");
    script.push_str("    request = JSON.parse(line);\n");
    script.push_str("  } catch (error) {\n");
    script.push_str("    emit({ ok: false, error: `bad request line: ${describe(error)}` });\n");
    script.push_str("    continue;\n");
    script.push_str("  }\n");
    script.push_str("  if (request.cmd === 'close') {\n");
    script.push_str("    break;\n");
    script.push_str("  }\n");
    script.push_str("  try {\n");
    script.push_str("    if (request.cmd === 'deliver') {\n");
    script.push_str("      emit(await deliver(request.url, request.message));\n");
    script.push_str("    } else if (request.cmd === 'scan_replies') {\n");
    script.push_str("      emit(await scanReplies(request.cap));\n");
    script.push_str("    } else {\n");
    script.push_str("      emit({ ok: false, error: `unknown command: ${request.cmd}` });\n");
    script.push_str("    }\n");
    script.push_str("  } catch (error) {\n");
    script.push_str("    emit({ ok: false, error: describe(error) });\n");
    script.push_str("  }\n");
    script.push_str("}\n\n");

    script.push_str("await context.close().catch(() => {});\n");
    script.push_str("await browser.close().catch(() => {});\n");
    script.push_str("emit({ ok: true, closed: true });\n");

    Ok(script)
}

struct CommandCapture {
    exit_code: i32,
    stdout: String,
}

async fn run_command_capture(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<CommandCapture> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match timeout(Duration::from_secs(timeout_secs), command.output()).await {
        Ok(result) => result?,
        Err(_) => bail!("Command timed out after {} seconds", timeout_secs),
    };

    Ok(CommandCapture {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
    })
}

fn detect_chromium_cache() -> bool {
    if let Ok(path) = std::env::var("PLAYWRIGHT_BROWSERS_PATH") {
        let parsed = std::path::PathBuf::from(path);
        if parsed.exists() {
            return true;
        }
    }

    let mut candidates = Vec::new();

    if let Ok(home) = std::env::var("HOME") {
        candidates.push(std::path::PathBuf::from(&home).join(".cache/ms-playwright"));
        candidates.push(std::path::PathBuf::from(&home).join("Library/Caches/ms-playwright"));
    }

    if let Ok(user_profile) = std::env::var("USERPROFILE") {
        candidates.push(std::path::PathBuf::from(user_profile).join("AppData/Local/ms-playwright"));
    }

    candidates.into_iter().any(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_driver_line_requires_marker() {
        assert!(parse_driver_line("plain output").is_none());
        let payload =
            parse_driver_line("__OUTFLOW_DRIVER__={\"ok\":true,\"delivery\":\"sent\"}").unwrap();
        assert_eq!(payload["delivery"], "sent");
    }

    #[test]
    fn parse_driver_line_rejects_bad_json() {
        assert!(parse_driver_line("__OUTFLOW_DRIVER__={not json").is_none());
    }

    #[test]
    fn session_runner_injects_cookies_before_navigation() {
        let cookies = parse_cookie_string("d=xoxd-1; lc=12345");
        let script = build_session_runner(&cookies, &Pacing::default()).unwrap();

        let add_cookies = script.find("context.addCookies(cookies)").unwrap();
        let new_page = script.find("context.newPage()").unwrap();
        assert!(add_cookies < new_page);
        assert!(script.contains("\"xoxd-1\""));
        assert!(script.contains("headless: true"));
    }

    #[test]
    fn session_runner_contains_campaign_and_reply_paths() {
        let script = build_session_runner(&[], &Pacing::default()).unwrap();

        assert!(script.contains("page.$('button:has-text(\"Message\")')"));
        assert!(script.contains("div.c-virtual_list__item"));
        assert!(script.contains("https://app.slack.com/client"));
        assert!(script.contains("keyboard.press('Enter')"));
        assert!(script.contains("toLowerCase().includes(REPLY_TOKEN)"));
    }

    #[test]
    fn session_runner_embeds_pacing_values() {
        let pacing = Pacing {
            profile_settle_ms: 111,
            composer_settle_ms: 222,
            replies_settle_ms: 333,
        };
        let script = build_session_runner(&[], &pacing).unwrap();
        assert!(script.contains("\"profile_settle_ms\":111"));
        assert!(script.contains("\"replies_settle_ms\":333"));
    }
}
