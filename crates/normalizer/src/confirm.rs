//! バックアップ失敗時に処理を続行するかどうかの確認。

use std::io::{BufRead, Write};

/// 続行確認の問い合わせ先。
pub trait Confirm {
    /// `true` なら続行する。
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// 常に同じ回答を返す。非対話実行とテスト用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Always(pub bool);

impl Confirm for Always {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

/// プロンプトを出力し、1 行読み取って `y` なら続行する。
///
/// 読み取りに失敗した場合や入力が終端に達した場合は続行しない。
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirm<std::io::StdinLock<'static>, std::io::Stderr> {
    /// 標準入力から回答を読み取る。
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} (y/n): ").is_err() || self.output.flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        }
    }
}
