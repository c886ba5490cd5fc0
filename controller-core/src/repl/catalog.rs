//! Console command catalog expressed as a small grammar AST.
//!
//! The parser interprets the same structure that `help` renders, so keywords,
//! argument layouts and usage strings stay in sync.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Click,
    Hold,
    Wait,
    Status,
    History,
    Help,
}

/// Kind of value an argument slot accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueSpec {
    /// `250ms`, `3s`.
    Duration,
    /// Unsuffixed integer in `1..=255`.
    Count,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    End,
    /// A value that must be present.
    Required {
        value: ValueSpec,
        next: &'static Node,
    },
    /// A value that may be omitted; the command supplies its own default.
    Optional {
        value: ValueSpec,
        next: &'static Node,
    },
    /// Free-form identifier naming a help topic.
    Topic { next: &'static Node },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub tag: CommandTag,
    pub grammar: &'static Node,
    pub usage: &'static str,
    pub summary: &'static str,
}

const END: Node = Node::End;

const OPTIONAL_COUNT: Node = Node::Optional {
    value: ValueSpec::Count,
    next: &END,
};

const REQUIRED_DURATION: Node = Node::Required {
    value: ValueSpec::Duration,
    next: &END,
};

const HELP_GRAMMAR: Node = Node::Topic { next: &END };

const COMMANDS: [CommandSpec; 6] = [
    CommandSpec {
        name: "click",
        tag: CommandTag::Click,
        grammar: &OPTIONAL_COUNT,
        usage: "click [count]",
        summary: "press and release the button `count` times (same as `<count>C`)",
    },
    CommandSpec {
        name: "hold",
        tag: CommandTag::Hold,
        grammar: &OPTIONAL_COUNT,
        usage: "hold [count]",
        summary: "press `count` times and keep the last press held (same as `<count>H`)",
    },
    CommandSpec {
        name: "wait",
        tag: CommandTag::Wait,
        grammar: &REQUIRED_DURATION,
        usage: "wait <duration>",
        summary: "advance the clock, delivering display ticks and task completions",
    },
    CommandSpec {
        name: "status",
        tag: CommandTag::Status,
        grammar: &END,
        usage: "status",
        summary: "show the current state, context and live resources",
    },
    CommandSpec {
        name: "history",
        tag: CommandTag::History,
        grammar: &OPTIONAL_COUNT,
        usage: "history [count]",
        summary: "list the most recent controller events",
    },
    CommandSpec {
        name: "help",
        tag: CommandTag::Help,
        grammar: &HELP_GRAMMAR,
        usage: "help [command]",
        summary: "list commands or describe one",
    },
];

/// Returns the full command catalog.
#[must_use]
pub const fn commands() -> &'static [CommandSpec] {
    &COMMANDS
}

/// Finds a command by name (case insensitive).
#[must_use]
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find("WAIT").map(|spec| spec.tag), Some(CommandTag::Wait));
        assert_eq!(find("strobe"), None);
    }

    #[test]
    fn names_are_unique() {
        for (index, spec) in commands().iter().enumerate() {
            assert!(
                commands()[index + 1..]
                    .iter()
                    .all(|other| other.name != spec.name)
            );
        }
    }
}
