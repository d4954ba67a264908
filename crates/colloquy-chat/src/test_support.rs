//! Codec with a scripted generator, for driving sessions in tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use colloquy_common::CodecError;

use crate::codec::{SamplingParams, TokenCodec, TokenId, TokenStream};
use crate::echo::EchoCodec;
use crate::format::PromptFormat;

/// Echo vocabulary, but `generate` yields a fixed token list followed by
/// `tail` forever (or nothing, when `tail` is `None`).
pub struct ScriptedCodec {
    inner: EchoCodec,
    script: Vec<TokenId>,
    tail: Option<TokenId>,
    generate_calls: Rc<Cell<usize>>,
    pulled: Rc<Cell<usize>>,
    grammars: Rc<RefCell<Vec<Option<String>>>>,
}

impl ScriptedCodec {
    pub fn new(format: PromptFormat, capacity: usize) -> Self {
        Self {
            inner: EchoCodec::new(format, capacity),
            script: Vec::new(),
            tail: None,
            generate_calls: Rc::new(Cell::new(0)),
            pulled: Rc::new(Cell::new(0)),
            grammars: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Generate `text` as plain character tokens, markers included verbatim.
    pub fn replying(mut self, text: &str) -> Self {
        self.script = self.plain(text);
        self
    }

    pub fn then_eos(mut self) -> Self {
        self.tail = Some(self.inner.end_of_sequence());
        self
    }

    pub fn then_repeat(mut self, text: &str) -> Self {
        self.tail = self.plain(text).first().copied();
        self
    }

    pub fn then_special(mut self, marker: &str) -> Self {
        self.tail = self
            .inner
            .tokenize(marker, false, true)
            .ok()
            .and_then(|t| t.first().copied());
        self
    }

    pub fn plain(&self, text: &str) -> Vec<TokenId> {
        self.inner.tokenize(text, false, false).unwrap()
    }

    pub fn generate_calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.generate_calls)
    }

    pub fn pulled(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.pulled)
    }

    /// Grammar passed to each `generate` call, in call order.
    pub fn grammars(&self) -> Rc<RefCell<Vec<Option<String>>>> {
        Rc::clone(&self.grammars)
    }
}

impl TokenCodec for ScriptedCodec {
    fn tokenize(
        &self,
        text: &str,
        add_leading: bool,
        special: bool,
    ) -> Result<Vec<TokenId>, CodecError> {
        self.inner.tokenize(text, add_leading, special)
    }

    fn detokenize(&self, tokens: &[TokenId]) -> Result<String, CodecError> {
        self.inner.detokenize(tokens)
    }

    fn context_capacity(&self) -> usize {
        self.inner.context_capacity()
    }

    fn end_of_sequence(&self) -> TokenId {
        self.inner.end_of_sequence()
    }

    fn generate(&self, _prefix: &[TokenId], sampling: &SamplingParams) -> TokenStream {
        self.generate_calls.set(self.generate_calls.get() + 1);
        self.grammars.borrow_mut().push(sampling.grammar.clone());
        let pulled = Rc::clone(&self.pulled);
        let tail: Box<dyn Iterator<Item = TokenId>> = match self.tail {
            Some(token) => Box::new(std::iter::repeat(token)),
            None => Box::new(std::iter::empty()),
        };
        Box::new(
            self.script
                .clone()
                .into_iter()
                .chain(tail)
                .inspect(move |_| pulled.set(pulled.get() + 1)),
        )
    }
}
