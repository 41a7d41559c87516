//! Pull-style HTML token stream over any `Read`
//!
//! html5ever's tokenizer pushes tokens into a sink. This module reads the input in
//! chunks, feeds the tokenizer, and hands the queued tokens back one at a time so the
//! analyzer can be written as a plain `for` loop. Adjacent character runs are merged
//! into a single `Token::Text`, including runs split across read boundaries.
//!
//! Bytes are decoded with `encoding_rs`, UTF-8 unless the caller knows better.
//! Malformed sequences become U+FFFD and a leading byte order mark is honoured.

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token as RawToken, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts, TokenizerResult,
};
use std::collections::VecDeque;
use std::io::{self, Read};
use tracing::{trace, warn};

/// Bytes requested from the reader per read call
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A `<!DOCTYPE ...>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    /// Doctype name, lower-cased by the tokenizer (empty when absent)
    pub name: String,

    /// Public identifier followed by system identifier, whichever are present
    pub identifiers: Vec<String>,
}

/// A single `name="value"` pair on a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lower-case attribute name
    pub name: String,

    /// Raw attribute value with character references decoded
    pub value: String,
}

/// An opening tag, including self-closing ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lower-case tag name
    pub name: String,

    /// Attributes in document order
    pub attrs: Vec<Attribute>,

    /// Whether the tag was written as `<name ... />`
    pub self_closing: bool,
}

impl StartTag {
    /// Values of every attribute called `name`, in document order
    pub fn attr_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attrs
            .iter()
            .filter(move |attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

/// Tokens handed to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Document type declaration
    Doctype(Doctype),

    /// Start or self-closing tag
    StartTag(StartTag),

    /// End tag, by lower-case name
    EndTag(String),

    /// A maximal run of character data
    Text(String),

    /// Comment body
    Comment(String),
}

/// Streaming token iterator; the reader is dropped together with the iterator
pub struct HtmlTokens<R> {
    reader: R,
    tokenizer: Tokenizer<TokenQueue>,
    input: BufferQueue,
    decoder: Decoder,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> HtmlTokens<R> {
    /// Start tokenizing UTF-8 from `reader`; nothing is read until the first `next()`
    pub fn new(reader: R) -> Self {
        Self::with_encoding(reader, UTF_8)
    }

    /// Start tokenizing `reader`, decoding it as `encoding`
    pub fn with_encoding(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            tokenizer: Tokenizer::new(TokenQueue::default(), TokenizerOpts::default()),
            input: BufferQueue::new(),
            decoder: encoding.new_decoder(),
            buf: vec![0; READ_CHUNK_SIZE],
            finished: false,
        }
    }

    /// A token can be released once we know it will not grow any further.
    fn ready(&self) -> bool {
        let queue = &self.tokenizer.sink.queue;
        match queue.front() {
            None => false,
            Some(Token::Text(_)) => queue.len() > 1 || self.finished,
            Some(_) => true,
        }
    }

    fn pump(&mut self) {
        let read = loop {
            match self.reader.read(&mut self.buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match read {
            Ok(0) => self.finish(),
            Ok(n) => {
                trace!(bytes = n, "read chunk");
                let text = decode_chunk(&mut self.decoder, &self.buf[..n], false);
                self.feed(&text);
            }
            Err(err) => {
                warn!(error = %err, "read failed, treating as end of document");
                self.finish();
            }
        }
    }

    fn feed(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(text));
        loop {
            match self.tokenizer.feed(&mut self.input) {
                TokenizerResult::Done => break,
                // the sink never asks for script pauses; resume if one happens anyway
                TokenizerResult::Script(()) => trace!("tokenizer paused after a script"),
            }
        }
    }

    fn finish(&mut self) {
        let rest = decode_chunk(&mut self.decoder, &[], true);
        self.feed(&rest);
        self.tokenizer.end();
        self.finished = true;
    }
}

impl<R: Read> Iterator for HtmlTokens<R> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while !self.ready() && !self.finished {
            self.pump();
        }
        self.tokenizer.sink.queue.pop_front()
    }
}

/// Sink that converts html5ever tokens into our own and queues them
#[derive(Debug, Default)]
struct TokenQueue {
    queue: VecDeque<Token>,
}

impl TokenQueue {
    fn push_text(&mut self, text: &str) {
        if let Some(Token::Text(last)) = self.queue.back_mut() {
            last.push_str(text);
        } else {
            self.queue.push_back(Token::Text(text.to_string()));
        }
    }
}

impl TokenSink for TokenQueue {
    type Handle = ();

    fn process_token(&mut self, token: RawToken, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            RawToken::DoctypeToken(doctype) => {
                let identifiers = [doctype.public_id, doctype.system_id]
                    .into_iter()
                    .flatten()
                    .map(|id| id.to_string())
                    .collect();
                self.queue.push_back(Token::Doctype(Doctype {
                    name: doctype.name.map(|n| n.to_string()).unwrap_or_default(),
                    identifiers,
                }));
            }
            RawToken::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let switch = if tag.self_closing {
                            None
                        } else {
                            text_state_for(&name)
                        };
                        let attrs = tag
                            .attrs
                            .into_iter()
                            .map(|attr| Attribute {
                                name: attr.name.local.to_string(),
                                value: attr.value.to_string(),
                            })
                            .collect();
                        self.queue.push_back(Token::StartTag(StartTag {
                            name,
                            attrs,
                            self_closing: tag.self_closing,
                        }));
                        if let Some(result) = switch {
                            return result;
                        }
                    }
                    TagKind::EndTag => self.queue.push_back(Token::EndTag(name)),
                }
            }
            RawToken::CharacterTokens(text) => self.push_text(&text),
            RawToken::CommentToken(text) => self.queue.push_back(Token::Comment(text.to_string())),
            RawToken::NullCharacterToken | RawToken::EOFToken | RawToken::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

/// Elements whose content is text rather than markup.
///
/// Without a tree builder the tokenizer never switches state on its own, so the
/// sink has to ask for it, the same way a browser's parser would.
fn text_state_for(tag_name: &str) -> Option<TokenSinkResult<()>> {
    match tag_name {
        "title" | "textarea" => Some(TokenSinkResult::RawData(RawKind::Rcdata)),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            Some(TokenSinkResult::RawData(RawKind::Rawtext))
        }
        "script" => Some(TokenSinkResult::RawData(RawKind::ScriptData)),
        "plaintext" => Some(TokenSinkResult::Plaintext),
        _ => None,
    }
}

/// Decode one chunk, keeping a code point split across chunks for the next call
fn decode_chunk(decoder: &mut Decoder, bytes: &[u8], last: bool) -> String {
    let mut out = String::with_capacity(
        decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len()),
    );
    let mut rest = bytes;
    loop {
        let (result, read, _) = decoder.decode_to_string(rest, &mut out, last);
        rest = &rest[read..];
        match result {
            CoderResult::InputEmpty => return out,
            CoderResult::OutputFull => out.reserve(
                decoder
                    .max_utf8_buffer_length(rest.len())
                    .unwrap_or(rest.len())
                    .max(4),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that hands out one byte per call
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    fn tokens(html: &str) -> Vec<Token> {
        HtmlTokens::new(html.as_bytes()).collect()
    }

    fn start(name: &str, attrs: &[(&str, &str)]) -> Token {
        Token::StartTag(StartTag {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(n, v)| Attribute {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            self_closing: false,
        })
    }

    #[test]
    fn test_title_content_is_text() {
        assert_eq!(
            tokens("<title>a<b>c</title>"),
            vec![
                start("title", &[]),
                Token::Text("a<b>c".to_string()),
                Token::EndTag("title".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_runs_are_merged_across_reads() {
        let html = "<p>Hello\nWorld &amp; more</p>";
        let trickled: Vec<Token> = HtmlTokens::new(Trickle(html.as_bytes())).collect();

        assert_eq!(trickled, tokens(html));
        assert_eq!(trickled[1], Token::Text("Hello\nWorld & more".to_string()));
    }

    #[test]
    fn test_names_are_lower_cased() {
        assert_eq!(
            tokens(r#"<A HREF="/Docs">x</A>"#),
            vec![
                start("a", &[("href", "/Docs")]),
                Token::Text("x".to_string()),
                Token::EndTag("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_doctype_identifiers_in_order() {
        let html = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#;
        assert_eq!(
            tokens(html),
            vec![Token::Doctype(Doctype {
                name: "html".to_string(),
                identifiers: vec![
                    "-//W3C//DTD HTML 4.01//EN".to_string(),
                    "http://www.w3.org/TR/html4/strict.dtd".to_string(),
                ],
            })]
        );
    }

    #[test]
    fn test_script_body_is_not_markup() {
        let found = tokens(r#"<script>var s = "<a href='/x'>";</script><a href="/y">y</a>"#);
        let anchors = found
            .iter()
            .filter(|t| matches!(t, Token::StartTag(tag) if tag.name == "a"))
            .count();
        assert_eq!(anchors, 1);
    }

    #[test]
    fn test_self_closing_flag() {
        let found = tokens(r#"<input type="password"/>"#);
        match &found[0] {
            Token::StartTag(tag) => {
                assert!(tag.self_closing);
                assert_eq!(tag.attr_values("type").collect::<Vec<_>>(), vec!["password"]);
            }
            other => panic!("expected start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_has_no_tokens() {
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_multibyte_characters_split_across_reads() {
        let html = "<title>Crème brûlée 🍮</title>";
        let trickled: Vec<Token> = HtmlTokens::new(Trickle(html.as_bytes())).collect();
        assert_eq!(trickled[1], Token::Text("Crème brûlée 🍮".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let found: Vec<Token> = HtmlTokens::new(&b"<p>a\xffb</p>"[..]).collect();
        assert_eq!(found[1], Token::Text("a\u{FFFD}b".to_string()));
    }

    #[test]
    fn test_legacy_encoding() {
        let html = b"<title>Caf\xe9</title>";
        let found: Vec<Token> =
            HtmlTokens::with_encoding(Trickle(html), encoding_rs::WINDOWS_1252).collect();
        assert_eq!(found[1], Token::Text("Caf\u{e9}".to_string()));
    }

    #[test]
    fn test_truncated_sequence_at_end_of_input() {
        let found: Vec<Token> = HtmlTokens::new(&b"<p>ok\xe2\x82"[..]).collect();
        assert_eq!(found[1], Token::Text("ok\u{FFFD}".to_string()));
    }

    #[test]
    fn test_byte_order_mark_is_dropped() {
        let found: Vec<Token> = HtmlTokens::new(&b"\xef\xbb\xbf<h1>x</h1>"[..]).collect();
        assert_eq!(found[0], start("h1", &[]));
    }
}
