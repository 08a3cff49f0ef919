// Name parser: flat `%token` substitution for file names, paths and URLs

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use rand::seq::IndexedRandom;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::codes::*;
use super::helpers::{
    any_argument, line_separator, login_name, machine_name, no_argument, pad_zeroes,
    random_string, replace_numeric_token, replace_token, sanitize_file_name, sanitize_path,
    sanitize_url, to_base, truncate_chars, user_name,
};
use crate::domain::template::apply_keeping_escapes;
use crate::error::{TemplateError, TemplateResult};

/// What the parsed name is going to be used as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameParserType {
    #[default]
    Text,
    FileName,
    FilePath,
    Url,
}

impl FromStr for NameParserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(NameParserType::Text),
            "filename" | "file" => Ok(NameParserType::FileName),
            "filepath" | "path" => Ok(NameParserType::FilePath),
            "url" => Ok(NameParserType::Url),
            other => Err(format!("unknown name type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NameParser {
    pub parser_type: NameParserType,
    pub window_text: Option<String>,
    pub process_name: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub auto_increment_number: u64,
    pub time_zone: Option<Tz>,
    pub is_preview: bool,
    pub max_title_length: Option<usize>,
    pub max_name_length: Option<usize>,
    /// Clock override; the current local time is used when unset
    pub fixed_time: Option<DateTime<FixedOffset>>,
}

impl NameParser {
    pub fn new(parser_type: NameParserType) -> Self {
        Self {
            parser_type,
            ..Default::default()
        }
    }

    pub fn with_window(mut self, window_text: &str, process_name: &str) -> Self {
        self.window_text = Some(window_text.to_string());
        self.process_name = Some(process_name.to_string());
        self
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }

    pub fn with_auto_increment_number(mut self, number: u64) -> Self {
        self.auto_increment_number = number;
        self
    }

    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    pub fn with_preview(mut self, is_preview: bool) -> Self {
        self.is_preview = is_preview;
        self
    }

    pub fn with_max_lengths(mut self, title: Option<usize>, name: Option<usize>) -> Self {
        self.max_title_length = title;
        self.max_name_length = name;
        self
    }

    pub fn with_fixed_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.fixed_time = Some(time);
        self
    }

    pub fn parse(&mut self, pattern: &str) -> TemplateResult<String> {
        let mut call = self.begin_call(pattern);
        self.parse_span(pattern, &mut call)
    }

    /// Parse only the unescaped runs of `text`, keeping escaped characters
    /// and their markers. The counter still moves at most once, and every run
    /// sees the same clock.
    pub fn parse_keeping_escapes(&mut self, text: &str, escape: char) -> TemplateResult<String> {
        let mut call = self.begin_call(text);
        apply_keeping_escapes(text, escape, |span| self.parse_span(span, &mut call))
    }

    fn begin_call(&self, pattern: &str) -> CallState {
        let (local, timestamp) = self.now();
        CallState {
            incremented: None,
            local,
            timestamp,
            twelve_hour: pattern.contains(AM_PM),
        }
    }

    fn parse_span(&mut self, pattern: &str, call: &mut CallState) -> TemplateResult<String> {
        if pattern.is_empty() {
            return Ok(String::new());
        }

        let mut text = pattern.to_string();

        if let Some(title) = &self.window_text {
            text = text.replace(WINDOW_TITLE, &self.sanitize_input(title));
        }
        if let Some(process) = &self.process_name {
            text = text.replace(PROCESS_NAME, &self.sanitize_input(process));
        }

        text = text
            .replace(IMAGE_WIDTH, &self.image_width.map(|w| w.to_string()).unwrap_or_default())
            .replace(IMAGE_HEIGHT, &self.image_height.map(|h| h.to_string()).unwrap_or_default());

        text = replace_date_tokens(&text, call);

        if AUTO_INCREMENT_TOKENS.iter().any(|token| text.contains(token)) {
            let number = *call.incremented.get_or_insert_with(|| {
                self.auto_increment_number += 1;
                self.auto_increment_number
            });
            text = replace_auto_increment(&text, number)?;
        }

        text = text
            .replace(USER_LOGIN_NAME, &login_name())
            .replace(USER_NAME, &user_name())
            .replace(MACHINE_NAME, &machine_name());

        if self.parser_type == NameParserType::Text {
            text = text.replace(NEW_LINE, line_separator());
        }

        text = replace_random(&text, RANDOM_NON_AMBIGUOUS, ALPHANUMERIC_NON_AMBIGUOUS)?;
        text = replace_random(&text, RANDOM_DIGIT, NUMBERS)?;
        text = replace_random(&text, RANDOM_ALPHANUMERIC, ALPHANUMERIC)?;
        text = replace_random(&text, RANDOM_HEX, HEXADECIMAL)?;
        text = replace_random(&text, RANDOM_HEX_UPPER, &HEXADECIMAL.to_uppercase())?;

        let is_preview = self.is_preview;
        text = replace_token(&text, RANDOM_LINE_FROM_FILE, any_argument, |path| {
            match random_line_from_file(path.unwrap_or_default()) {
                Err(err) if is_preview => Ok(err.to_string()),
                result => result,
            }
        })?;

        text = replace_token(&text, GUID_UPPER, no_argument, |_| {
            Ok(uuid::Uuid::new_v4().to_string().to_uppercase())
        })?;
        text = replace_token(&text, GUID, no_argument, |_| Ok(uuid::Uuid::new_v4().to_string()))?;

        text = match self.parser_type {
            NameParserType::Text => text,
            NameParserType::FileName => sanitize_file_name(&text),
            NameParserType::FilePath => sanitize_path(&text),
            NameParserType::Url => sanitize_url(&text),
        };

        if let Some(max) = self.max_name_length {
            text = truncate_chars(&text, max);
        }

        debug!(pattern, result = %text, "Parsed name pattern");
        Ok(text)
    }

    fn sanitize_input(&self, input: &str) -> String {
        let mut input = input.trim().replace(' ', "_");
        if matches!(self.parser_type, NameParserType::FileName | NameParserType::FilePath) {
            input = sanitize_file_name(&input);
        }
        if let Some(max) = self.max_title_length {
            input = truncate_chars(&input, max);
        }
        input
    }

    fn now(&self) -> (NaiveDateTime, i64) {
        let now = self.fixed_time.unwrap_or_else(|| Local::now().fixed_offset());
        let local = match self.time_zone {
            Some(tz) => now.with_timezone(&tz).naive_local(),
            None => now.naive_local(),
        };
        (local, now.timestamp())
    }
}

/// Values shared by every span of one parse call
struct CallState {
    incremented: Option<u64>,
    local: NaiveDateTime,
    timestamp: i64,
    twelve_hour: bool,
}

fn replace_date_tokens(text: &str, call: &CallState) -> String {
    let local = call.local;
    let month_name = local.format("%B").to_string();
    let weekday_name = local.format("%A").to_string();

    let hour = if call.twelve_hour {
        local.hour12().1
    } else {
        local.hour()
    };
    let am_pm = if local.hour() >= 12 { "PM" } else { "AM" };

    // Longer tokens go first where they share a prefix
    text.replace(MONTH_NAME_INVARIANT, &month_name)
        .replace(MONTH_NAME, &month_name)
        .replace(YEAR_SHORT, &format!("{:02}", local.year().rem_euclid(100)))
        .replace(YEAR, &local.year().to_string())
        .replace(MONTH, &format!("{:02}", local.month()))
        .replace(DAY, &format!("{:02}", local.day()))
        .replace(HOUR, &format!("{:02}", hour))
        .replace(MINUTE, &format!("{:02}", local.minute()))
        .replace(MILLISECOND, &format!("{:03}", local.nanosecond() / 1_000_000 % 1000))
        .replace(SECOND, &format!("{:02}", local.second()))
        .replace(WEEK_OF_YEAR, &format!("{:02}", local.iso_week().week()))
        .replace(WEEKDAY_NAME_INVARIANT, &weekday_name)
        .replace(WEEKDAY_NAME, &weekday_name)
        .replace(AM_PM, am_pm)
        .replace(UNIX_TIMESTAMP, &call.timestamp.to_string())
}

fn replace_auto_increment(text: &str, number: u64) -> TemplateResult<String> {
    let mut text = replace_numeric_token(text, AUTO_INCREMENT_BASE, |args| {
        in_base(number, args, ALPHANUMERIC_INVERSE)
    })?;
    text = replace_numeric_token(&text, AUTO_INCREMENT_BASE_UPPER, |args| {
        in_base(number, args, ALPHANUMERIC)
    })?;

    let fixed_bases: [(&str, usize, &str); 7] = [
        (AUTO_INCREMENT_BASE62, 62, ALPHANUMERIC),
        (AUTO_INCREMENT_BASE62_INVERSE, 62, ALPHANUMERIC_INVERSE),
        (AUTO_INCREMENT_BASE36, 36, ALPHANUMERIC_INVERSE),
        (AUTO_INCREMENT_BASE36_UPPER, 36, ALPHANUMERIC),
        (AUTO_INCREMENT_HEX, 16, ALPHANUMERIC_INVERSE),
        (AUTO_INCREMENT_HEX_UPPER, 16, ALPHANUMERIC),
        (AUTO_INCREMENT, 10, NUMBERS),
    ];

    for (token, base, alphabet) in fixed_bases {
        text = replace_numeric_token(&text, token, |args| {
            let width = args.first().copied().unwrap_or(0);
            Ok(pad_zeroes(&to_base(number, base, alphabet), width))
        })?;
    }

    Ok(text)
}

/// `{base,width}` arguments, base 10 when omitted
fn in_base(number: u64, args: &[usize], alphabet: &str) -> TemplateResult<String> {
    let base = args.first().copied().unwrap_or(10);
    let max = alphabet.chars().count();
    if !(2..=max).contains(&base) {
        return Err(TemplateError::InvalidSyntax(format!(
            "base must be between 2 and {}, got {}",
            max, base
        )));
    }
    let width = args.get(1).copied().unwrap_or(0);
    Ok(pad_zeroes(&to_base(number, base, alphabet), width))
}

fn replace_random(text: &str, token: &str, alphabet: &str) -> TemplateResult<String> {
    replace_numeric_token(text, token, |args| {
        Ok(random_string(alphabet, args.first().copied().unwrap_or(1)))
    })
}

fn random_line_from_file(path: &str) -> TemplateResult<String> {
    let path = Path::new(path.trim());
    let invalid = || TemplateError::InvalidTextFile(path.display().to_string());
    if !path.is_file() {
        return Err(invalid());
    }

    let content = std::fs::read_to_string(path).map_err(|_| invalid())?;
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    Ok(lines
        .choose(&mut rand::rng())
        .map(|line| line.to_string())
        .unwrap_or_default())
}
