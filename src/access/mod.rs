//! Access-rule files: parsing, merging and flag application.
//!
//! One rule per line:
//!
//! ```text
//! public net.example.Foo                      # the class itself
//! public-f net.example.Foo counter            # a field, drop final
//! protected net.example.Foo tick()V           # a method
//! public net.example.Foo *                    # every field
//! public net.example.Foo *()                  # every method
//! ```
//!
//! Class names are dotted; they are stored in internal (`/`) form. When two
//! rules name the same target, the one merged last wins.

pub mod apply;

pub use apply::transform_class;

use crate::bytecode::flags::{ACC_FINAL, ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC, VISIBILITY_MASK};
use crate::errors::{PipelineError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed location of the rule file inside a jar.
pub const RULES_PATH: &str = "META-INF/accesstransformer.cfg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Private,
    Default,
    Protected,
    Public,
}

impl Visibility {
    pub fn of(flags: u16) -> Self {
        if flags & ACC_PUBLIC != 0 {
            Visibility::Public
        } else if flags & ACC_PROTECTED != 0 {
            Visibility::Protected
        } else if flags & ACC_PRIVATE != 0 {
            Visibility::Private
        } else {
            Visibility::Default
        }
    }

    fn bits(self) -> u16 {
        match self {
            Visibility::Private => ACC_PRIVATE,
            Visibility::Default => 0,
            Visibility::Protected => ACC_PROTECTED,
            Visibility::Public => ACC_PUBLIC,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Default => "default",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalChange {
    Keep,
    Remove,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessChange {
    pub visibility: Visibility,
    pub final_change: FinalChange,
}

impl AccessChange {
    /// Apply to raw access flags. Visibility is only ever widened.
    pub fn apply(&self, flags: u16) -> u16 {
        let mut flags = flags;
        if self.visibility > Visibility::of(flags) {
            flags = (flags & !VISIBILITY_MASK) | self.visibility.bits();
        }
        match self.final_change {
            FinalChange::Keep => flags,
            FinalChange::Remove => flags & !ACC_FINAL,
            FinalChange::Add => flags | ACC_FINAL,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        let (keyword, final_change) = if let Some(k) = token.strip_suffix("-f") {
            (k, FinalChange::Remove)
        } else if let Some(k) = token.strip_suffix("+f") {
            (k, FinalChange::Add)
        } else {
            (token, FinalChange::Keep)
        };

        let visibility = match keyword {
            "public" => Visibility::Public,
            "protected" => Visibility::Protected,
            "default" => Visibility::Default,
            "private" => Visibility::Private,
            _ => return None,
        };
        Some(Self {
            visibility,
            final_change,
        })
    }
}

impl fmt::Display for AccessChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.final_change {
            FinalChange::Keep => "",
            FinalChange::Remove => "-f",
            FinalChange::Add => "+f",
        };
        write!(f, "{}{}", self.visibility.keyword(), suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleTarget {
    Class,
    Field(String),
    Method { name: String, descriptor: String },
    AllFields,
    AllMethods,
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTarget::Class => Ok(()),
            RuleTarget::Field(name) => write!(f, " {}", name),
            RuleTarget::Method { name, descriptor } => write!(f, " {}{}", name, descriptor),
            RuleTarget::AllFields => write!(f, " *"),
            RuleTarget::AllMethods => write!(f, " *()"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRuleSet {
    rules: BTreeMap<(String, RuleTarget), AccessChange>,
}

impl AccessRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut set = Self::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 || tokens.len() > 3 {
                return Err(rule_error(line_no, "expected '<modifier> <class> [member]'"));
            }

            let change = AccessChange::parse(tokens[0]).ok_or_else(|| {
                rule_error(line_no, &format!("unknown modifier '{}'", tokens[0]))
            })?;
            let class = tokens[1].replace('.', "/");
            let target = match tokens.get(2) {
                None => RuleTarget::Class,
                Some(&"*") => RuleTarget::AllFields,
                Some(&"*()") => RuleTarget::AllMethods,
                Some(member) => match member.find('(') {
                    Some(paren) => RuleTarget::Method {
                        name: member[..paren].to_string(),
                        descriptor: member[paren..].to_string(),
                    },
                    None => RuleTarget::Field(member.to_string()),
                },
            };

            set.insert(class, target, change);
        }

        Ok(set)
    }

    pub fn insert(&mut self, class: impl Into<String>, target: RuleTarget, change: AccessChange) {
        self.rules.insert((class.into(), target), change);
    }

    /// Layer `other` on top of `self`; its entries win on conflict.
    pub fn merge(&mut self, other: AccessRuleSet) {
        self.rules.extend(other.rules);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule names `class`.
    pub fn touches(&self, class: &str) -> bool {
        self.rules
            .range((class.to_string(), RuleTarget::Class)..)
            .next()
            .is_some_and(|((c, _), _)| c == class)
    }

    pub fn class_change(&self, class: &str) -> Option<AccessChange> {
        self.get(class, RuleTarget::Class)
    }

    pub fn field_change(&self, class: &str, name: &str) -> Option<AccessChange> {
        self.get(class, RuleTarget::Field(name.to_string()))
            .or_else(|| self.get(class, RuleTarget::AllFields))
    }

    pub fn method_change(&self, class: &str, name: &str, descriptor: &str) -> Option<AccessChange> {
        self.get(
            class,
            RuleTarget::Method {
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            },
        )
        .or_else(|| self.get(class, RuleTarget::AllMethods))
    }

    fn get(&self, class: &str, target: RuleTarget) -> Option<AccessChange> {
        self.rules.get(&(class.to_string(), target)).copied()
    }

    /// Canonical text form, one rule per line in sorted order.
    pub fn to_text(&self) -> String {
        self.rules
            .iter()
            .map(|((class, target), change)| {
                format!("{} {}{}\n", change, class.replace('/', "."), target)
            })
            .collect()
    }
}

fn rule_error(line: usize, message: &str) -> PipelineError {
    PipelineError::AccessRule {
        line,
        message: message.to_string(),
    }
}
