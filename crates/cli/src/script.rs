//! Command script parsing
//!
//! One command per line, tokens separated by whitespace. A `#` at the start
//! of a line or after whitespace begins a comment; blank lines are skipped.
//! Keys are always a single token. A trailing `<value>` argument takes the
//! rest of the line, so values may contain spaces and `#` inside a word:
//!
//! ```text
//! push-back main hello world      # value is "hello world"
//! insert-after main hello world   # key "hello", value "world"
//! push-back main C#               # value is "C#"
//! ```

/// A parsed script command. List names are created on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PushFront { list: String, value: String },
    PushBack { list: String, value: String },
    InsertAfter { list: String, key: String, value: String },
    InsertBefore { list: String, key: String, value: String },
    InsertAt { list: String, pos: usize, value: String },
    InsertSlot { list: String, slot: u32, value: String },
    InsertSorted { list: String, value: String },
    InsertSortedDesc { list: String, value: String },
    PopFront { list: String },
    PopBack { list: String },
    Remove { list: String, value: String },
    RemoveAll { list: String, value: String },
    RemoveAfter { list: String, key: String },
    RemoveBefore { list: String, key: String },
    RemoveSlot { list: String, slot: u32 },
    RemoveAt { list: String, pos: usize },
    Find { list: String, value: String },
    Get { list: String, pos: usize },
    Reverse { list: String },
    Dedup { list: String },
    Sort { list: String },
    SortDesc { list: String },
    Concat { dst: String, src: String },
    Clear { list: String },
    Print { list: String },
    Size { list: String },
    Free,
    Used,
}

/// A command together with its 1-based source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

/// Token cursor over one script line
struct Args<'s> {
    op: &'s str,
    tokens: Vec<&'s str>,
    next: usize,
}

impl<'s> Args<'s> {
    fn word(&mut self, what: &str) -> Result<String, String> {
        let token = self
            .tokens
            .get(self.next)
            .ok_or_else(|| format!("'{}' is missing its {} argument", self.op, what))?;
        self.next += 1;
        Ok(token.to_string())
    }

    fn number<N: std::str::FromStr>(&mut self, what: &str) -> Result<N, String> {
        let token = self.word(what)?;
        token
            .parse()
            .map_err(|_| format!("'{}' expects a number for {}, got '{}'", self.op, what, token))
    }

    /// Remaining tokens joined by single spaces
    fn rest(&mut self, what: &str) -> Result<String, String> {
        if self.next >= self.tokens.len() {
            return Err(format!("'{}' is missing its {} argument", self.op, what));
        }
        let value = self.tokens[self.next..].join(" ");
        self.next = self.tokens.len();
        Ok(value)
    }

    fn finish(self) -> Result<(), String> {
        if self.next < self.tokens.len() {
            return Err(format!(
                "'{}' has unexpected trailing argument '{}'",
                self.op, self.tokens[self.next]
            ));
        }
        Ok(())
    }
}

/// Parse a single non-empty, comment-free line
pub fn parse_command(text: &str) -> Result<Command, String> {
    let mut tokens = text.split_whitespace();
    let op = tokens.next().ok_or_else(|| "empty command".to_string())?;
    let mut args = Args {
        op,
        tokens: tokens.collect(),
        next: 0,
    };

    let command = match op {
        "push-front" => Command::PushFront {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "push-back" => Command::PushBack {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "insert-after" => Command::InsertAfter {
            list: args.word("list")?,
            key: args.word("key")?,
            value: args.rest("value")?,
        },
        "insert-before" => Command::InsertBefore {
            list: args.word("list")?,
            key: args.word("key")?,
            value: args.rest("value")?,
        },
        "insert-at" => Command::InsertAt {
            list: args.word("list")?,
            pos: args.number("position")?,
            value: args.rest("value")?,
        },
        "insert-slot" => Command::InsertSlot {
            list: args.word("list")?,
            slot: args.number("slot")?,
            value: args.rest("value")?,
        },
        "insert-sorted" => Command::InsertSorted {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "insert-sorted-desc" => Command::InsertSortedDesc {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "pop-front" => Command::PopFront {
            list: args.word("list")?,
        },
        "pop-back" => Command::PopBack {
            list: args.word("list")?,
        },
        "remove" => Command::Remove {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "remove-all" => Command::RemoveAll {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "remove-after" => Command::RemoveAfter {
            list: args.word("list")?,
            key: args.word("key")?,
        },
        "remove-before" => Command::RemoveBefore {
            list: args.word("list")?,
            key: args.word("key")?,
        },
        "remove-slot" => Command::RemoveSlot {
            list: args.word("list")?,
            slot: args.number("slot")?,
        },
        "remove-at" => Command::RemoveAt {
            list: args.word("list")?,
            pos: args.number("position")?,
        },
        "find" => Command::Find {
            list: args.word("list")?,
            value: args.rest("value")?,
        },
        "get" => Command::Get {
            list: args.word("list")?,
            pos: args.number("position")?,
        },
        "reverse" => Command::Reverse {
            list: args.word("list")?,
        },
        "dedup" => Command::Dedup {
            list: args.word("list")?,
        },
        "sort" => Command::Sort {
            list: args.word("list")?,
        },
        "sort-desc" => Command::SortDesc {
            list: args.word("list")?,
        },
        "concat" => Command::Concat {
            dst: args.word("destination list")?,
            src: args.word("source list")?,
        },
        "clear" => Command::Clear {
            list: args.word("list")?,
        },
        "print" => Command::Print {
            list: args.word("list")?,
        },
        "size" => Command::Size {
            list: args.word("list")?,
        },
        "free" => Command::Free,
        "used" => Command::Used,
        other => return Err(format!("unknown command '{}'", other)),
    };

    args.finish()?;
    Ok(command)
}

/// Cut a trailing comment: `#` at line start or right after whitespace
fn strip_comment(raw: &str) -> &str {
    let mut after_blank = true;
    for (at, ch) in raw.char_indices() {
        if ch == '#' && after_blank {
            return &raw[..at];
        }
        after_blank = ch.is_whitespace();
    }
    raw
}

/// Parse a whole script, reporting the first bad line
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, String> {
    let mut lines = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let text = strip_comment(raw);
        if text.trim().is_empty() {
            continue;
        }
        let command = parse_command(text).map_err(|e| format!("line {}: {}", i + 1, e))?;
        lines.push(ScriptLine {
            line: i + 1,
            command,
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_takes_rest_of_line() {
        assert_eq!(
            parse_command("push-back main hello   world").unwrap(),
            Command::PushBack {
                list: "main".to_string(),
                value: "hello world".to_string(),
            }
        );
        assert_eq!(
            parse_command("insert-after main k v w").unwrap(),
            Command::InsertAfter {
                list: "main".to_string(),
                key: "k".to_string(),
                value: "v w".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(
            parse_command("insert-slot l 3 x").unwrap(),
            Command::InsertSlot {
                list: "l".to_string(),
                slot: 3,
                value: "x".to_string(),
            }
        );
        let err = parse_command("get l two").unwrap_err();
        assert_eq!(err, "'get' expects a number for position, got 'two'");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("explode l").unwrap_err(),
            "unknown command 'explode'"
        );
        assert_eq!(
            parse_command("push-front l").unwrap_err(),
            "'push-front' is missing its value argument"
        );
        assert_eq!(
            parse_command("reverse a b").unwrap_err(),
            "'reverse' has unexpected trailing argument 'b'"
        );
    }

    #[test]
    fn test_parse_script_skips_comments_and_blanks() {
        let script = "# setup\n\npush-back a x   # trailing comment\nprint a\nfree\n";
        let lines = parse_script(script).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line, 3);
        assert_eq!(
            lines[0].command,
            Command::PushBack {
                list: "a".to_string(),
                value: "x".to_string(),
            }
        );
        assert_eq!(lines[2].command, Command::Free);
    }

    #[test]
    fn test_parse_script_reports_line_number() {
        let err = parse_script("print a\nbogus\n").unwrap_err();
        assert_eq!(err, "line 2: unknown command 'bogus'");
    }

    #[test]
    fn test_hash_inside_word_is_not_a_comment() {
        let lines = parse_script("push-back a C#\npush-back a x#y # note\n#whole line\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].command,
            Command::PushBack {
                list: "a".to_string(),
                value: "C#".to_string(),
            }
        );
        assert_eq!(
            lines[1].command,
            Command::PushBack {
                list: "a".to_string(),
                value: "x#y".to_string(),
            }
        );
    }

    #[test]
    fn test_keys_are_single_tokens() {
        assert_eq!(
            parse_command("remove-after l k").unwrap(),
            Command::RemoveAfter {
                list: "l".to_string(),
                key: "k".to_string(),
            }
        );
        assert_eq!(
            parse_command("remove-before l k extra").unwrap_err(),
            "'remove-before' has unexpected trailing argument 'extra'"
        );
    }
}
