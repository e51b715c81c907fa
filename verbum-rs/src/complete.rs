//! Completion suggestions for partially typed lines.
//!
//! The walk mirrors command resolution: complete words descend through the
//! tree by exact name, and the last word of a line that does not end in
//! whitespace is treated as a prefix still being typed. Nothing here mutates
//! the command tree, so it is safe to run on every keystroke.

use crate::command::Command;
use crate::parameter::ParamKind;
use crate::view::StringView;
use crate::Context;

/// Suggestions for the end of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Number of trailing characters of the line a candidate replaces.
    pub insertion_point: usize,

    /// Candidates in presentation order.
    pub candidates: Vec<String>,
}

impl Completion {
    /// Candidates replacing `fragment`.
    pub fn new(fragment: &str, candidates: Vec<String>) -> Self {
        Self {
            insertion_point: fragment.chars().count(),
            candidates,
        }
    }

    /// The `candidates` that start with `fragment`.
    pub fn filtered<I, S>(fragment: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates = candidates
            .into_iter()
            .filter(|candidate| candidate.as_ref().starts_with(fragment))
            .map(|candidate| candidate.as_ref().to_string())
            .collect();
        Self::new(fragment, candidates)
    }

    /// True when there is nothing to suggest.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Byte offset in `line` where the replaced text starts.
    pub fn start(&self, line: &str) -> usize {
        line.char_indices()
            .rev()
            .nth(self.insertion_point.saturating_sub(1))
            .filter(|_| self.insertion_point > 0)
            .map_or(line.len(), |(index, _)| index)
    }

    /// `line` with its trailing fragment replaced by `candidate`.
    pub fn apply(&self, line: &str, candidate: &str) -> String {
        format!("{}{}", &line[..self.start(line)], candidate)
    }
}

/// Names of `commands` starting with `fragment`. An empty fragment lists
/// primary names only, so aliases don't crowd the first suggestion list.
fn command_names<C: Context>(commands: &[Command<C>], fragment: &str) -> Completion {
    let candidates: Vec<String> = if fragment.is_empty() {
        commands.iter().map(|cmd| cmd.name().to_string()).collect()
    } else {
        commands
            .iter()
            .flat_map(|cmd| cmd.names())
            .filter(|name| name.starts_with(fragment))
            .cloned()
            .collect()
    };
    Completion::new(fragment, candidates)
}

enum Fragment {
    /// The word is followed by more input.
    Complete,
    /// The cursor sits at the end of this (possibly empty) word, which spans
    /// `raw` characters of the line.
    Current { word: String, raw: usize },
}

fn next_fragment(view: &mut StringView, open_word: bool) -> Fragment {
    match view.next_word() {
        Err(_) => Fragment::Current {
            word: String::new(),
            raw: 0,
        },
        Ok(word) if open_word && view.is_exhausted() => Fragment::Current {
            raw: raw_span(view),
            word,
        },
        Ok(_) => Fragment::Complete,
    }
}

/// Characters from the start of the last word, quotes included, to the end.
fn raw_span(view: &StringView) -> usize {
    view.text()[view.last_start()..].chars().count()
}

/// Widen a whole-word replacement to the word as typed, so a quoted word is
/// replaced together with its quotes.
fn covering(mut completion: Completion, word: &str, raw: usize) -> Completion {
    if completion.insertion_point == word.chars().count() {
        completion.insertion_point = raw;
    }
    completion
}

/// Suggestions for `line` against the top-level `commands`.
pub fn complete<C: Context>(commands: &[Command<C>], line: &str) -> Completion {
    // The last word is still being typed unless the line ends in whitespace.
    let open_word = line.chars().last().is_some_and(|c| c != ' ' && c != '\n');
    let mut view = StringView::new(line);
    let mut level = commands;
    let mut current: Option<&Command<C>> = None;

    loop {
        let word = match view.next_word() {
            Ok(word) => word,
            Err(_) => {
                return match current {
                    None => command_names(level, ""),
                    Some(cmd) => command_names(cmd.children(), ""),
                };
            }
        };

        if open_word && view.is_exhausted() {
            let names = covering(command_names(level, &word), &word, raw_span(&view));
            if current.is_none() || !names.is_empty() {
                return names;
            }
            view.unread();
            break;
        }

        match level.iter().find(|cmd| cmd.matches(&word)) {
            Some(cmd) => {
                current = Some(cmd);
                level = cmd.children();
                if level.is_empty() {
                    break;
                }
            }
            None if current.is_some() => {
                view.unread();
                break;
            }
            None => return Completion::default(),
        }
    }

    match current {
        Some(cmd) => complete_parameters(cmd, &mut view, open_word),
        None => Completion::default(),
    }
}

fn complete_parameters<C: Context>(
    command: &Command<C>,
    view: &mut StringView,
    open_word: bool,
) -> Completion {
    for param in command.parameters() {
        match param.kind() {
            ParamKind::Positional => {
                if let Fragment::Current { word, raw } = next_fragment(view, open_word) {
                    return covering(param.complete(&word), &word, raw);
                }
            }
            ParamKind::Variadic => loop {
                if let Fragment::Current { word, raw } = next_fragment(view, open_word) {
                    return covering(param.complete(&word), &word, raw);
                }
            },
            ParamKind::KeywordOnly => return param.complete(&view.remainder()),
        }
    }

    Completion::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered() {
        let completion = Completion::filtered("ca", ["cat", "car", "dog"]);
        assert_eq!(completion.candidates, vec!["cat", "car"]);
        assert_eq!(completion.insertion_point, 2);
    }

    #[test]
    fn test_start_counts_characters() {
        let completion = Completion::new("día", vec!["días".into()]);
        assert_eq!(completion.start("say día"), 4);
        assert_eq!(completion.apply("say día", "días"), "say días");
    }

    #[test]
    fn test_covering_widens_whole_word_only() {
        let whole = covering(Completion::new("s", vec!["slow".into()]), "s", 3);
        assert_eq!(whole.insertion_point, 3);
        assert_eq!(whole.apply("mode \"s\"", "slow"), "mode slow");

        let partial = covering(Completion::new("b", vec!["bob".into()]), "--name=b", 10);
        assert_eq!(partial.insertion_point, 1);
    }

    #[test]
    fn test_start_with_nothing_to_replace() {
        let completion = Completion::new("", vec!["x".into()]);
        assert_eq!(completion.start("give "), 5);
        assert_eq!(completion.apply("give ", "x"), "give x");
    }
}
