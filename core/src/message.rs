//! IRC message representation
//!
//! A [`Message`] is a plain value: prefix, command, middle parameters and an
//! optional trailing argument. Derived variants (`with_prefix`,
//! `with_params`, ...) copy the receiver and override one field, so a single
//! message can be handed to many mailboxes without anyone observing a change.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// IRC message prefix (server or user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prefix {
    /// Server name
    Server(String),
    /// User prefix (nick!user@host)
    User {
        nick: String,
        user: String,
        host: String,
    },
}

impl Prefix {
    /// Parse a raw prefix (without the leading colon)
    pub fn parse(raw: &str) -> Self {
        if let Some((nick, user_host)) = raw.split_once('!') {
            if let Some((user, host)) = user_host.split_once('@') {
                return Prefix::User {
                    nick: nick.to_string(),
                    user: user.to_string(),
                    host: host.to_string(),
                };
            }
        }
        Prefix::Server(raw.to_string())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Server(name) => write!(f, "{}", name),
            Prefix::User { nick, user, host } => write!(f, "{}!{}@{}", nick, user, host),
        }
    }
}

/// IRC command word or numeric reply code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    // Channel operations
    Join,
    Part,
    Mode,
    Topic,
    Names,

    // Messaging
    PrivMsg,
    Notice,

    // Connection
    Quit,
    Ping,
    Pong,
    Error,

    /// Three digit numeric reply
    Numeric(u16),

    /// Anything the core does not interpret
    Custom(String),
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageType::Join => "JOIN",
            MessageType::Part => "PART",
            MessageType::Mode => "MODE",
            MessageType::Topic => "TOPIC",
            MessageType::Names => "NAMES",
            MessageType::PrivMsg => "PRIVMSG",
            MessageType::Notice => "NOTICE",
            MessageType::Quit => "QUIT",
            MessageType::Ping => "PING",
            MessageType::Pong => "PONG",
            MessageType::Error => "ERROR",
            MessageType::Numeric(code) => return write!(f, "{:03}", code),
            MessageType::Custom(cmd) => cmd,
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(code) = s.parse() {
                return MessageType::Numeric(code);
            }
        }

        match s.to_uppercase().as_str() {
            "JOIN" => MessageType::Join,
            "PART" => MessageType::Part,
            "MODE" => MessageType::Mode,
            "TOPIC" => MessageType::Topic,
            "NAMES" => MessageType::Names,
            "PRIVMSG" => MessageType::PrivMsg,
            "NOTICE" => MessageType::Notice,
            "QUIT" => MessageType::Quit,
            "PING" => MessageType::Ping,
            "PONG" => MessageType::Pong,
            "ERROR" => MessageType::Error,
            _ => MessageType::Custom(s.to_string()),
        }
    }
}

/// IRC message as defined in RFC 1459
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Optional prefix (server or user)
    pub prefix: Option<Prefix>,
    /// Message command/type
    pub command: MessageType,
    /// Middle parameters
    pub params: Vec<String>,
    /// Final parameter, sent after " :" and allowed to contain spaces
    pub trailing: Option<String>,
}

impl Message {
    /// Create a new message
    pub fn new(command: MessageType, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command,
            params,
            trailing: None,
        }
    }

    /// Copy of this message with a different prefix
    pub fn with_prefix(&self, prefix: Prefix) -> Self {
        Self {
            prefix: Some(prefix),
            ..self.clone()
        }
    }

    /// Copy of this message with a different command
    pub fn with_command(&self, command: MessageType) -> Self {
        Self {
            command,
            ..self.clone()
        }
    }

    /// Copy of this message with its middle parameters replaced
    pub fn with_params<I, S>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Copy of this message with a trailing argument
    pub fn with_trailing(&self, trailing: impl Into<String>) -> Self {
        Self {
            trailing: Some(trailing.into()),
            ..self.clone()
        }
    }

    /// All arguments in order, the trailing one last
    pub fn arguments(&self) -> Vec<&str> {
        self.params
            .iter()
            .map(String::as_str)
            .chain(self.trailing.as_deref())
            .collect()
    }

    /// Argument at `index`, counting the trailing argument as the last one
    pub fn argument(&self, index: usize) -> Option<&str> {
        if index < self.params.len() {
            Some(&self.params[index])
        } else if index == self.params.len() {
            self.trailing.as_deref()
        } else {
            None
        }
    }

    /// Parse a single IRC line (with or without the CRLF terminator)
    pub fn parse(input: &str) -> Result<Self> {
        let mut rest = input.trim_end_matches(['\r', '\n']).trim_start();
        if rest.is_empty() {
            return Err(Error::MessageParse("Empty message".to_string()));
        }

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (raw, tail) = stripped
                    .split_once(' ')
                    .ok_or_else(|| Error::MessageParse("No command found".to_string()))?;
                rest = tail.trim_start();
                Some(Prefix::parse(raw))
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing.to_string())),
            None => (rest, None),
        };

        let mut words = head.split_whitespace();
        let command = words
            .next()
            .ok_or_else(|| Error::MessageParse("No command found".to_string()))?;

        Ok(Message {
            prefix,
            command: MessageType::from(command),
            params: words.map(str::to_string).collect(),
            trailing,
        })
    }

    /// Serialize to a CRLF terminated wire line
    pub fn to_line(&self) -> String {
        format!("{}\r\n", self)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}", self.command)?;

        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            // Only an unterminated final middle parameter may need the colon form
            let needs_colon = self.trailing.is_none()
                && i == last
                && (param.is_empty() || param.contains(' ') || param.starts_with(':'));
            if needs_colon {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }

        if let Some(ref trailing) = self.trailing {
            write!(f, " :{}", trailing)?;
        }

        Ok(())
    }
}
