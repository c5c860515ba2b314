use std::{ffi::OsStr, marker::PhantomData};

use clap::{
    builder::{TypedValueParser, ValueParserFactory},
    error::ErrorKind,
};

use crate::invoke::MakeInvoker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomValueParser<T>(PhantomData<T>);

impl<T> CustomValueParser<T> {
    pub fn new() -> Self {
        CustomValueParser(PhantomData)
    }
}

impl ValueParserFactory for MakeInvoker {
    type Parser = CustomValueParser<MakeInvoker>;

    fn value_parser() -> Self::Parser {
        CustomValueParser::new()
    }
}

/// Splits a build command like `"make -j8"` with shell quoting rules.
impl TypedValueParser for CustomValueParser<MakeInvoker> {
    type Value = MakeInvoker;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let invalid = |reason: &str| {
            let arg = arg.map_or_else(|| "...".to_string(), |a| a.to_string());
            clap::Error::raw(
                ErrorKind::InvalidValue,
                format!("Invalid build command {value:?} for '{arg}': {reason}\n"),
            )
            .with_cmd(cmd)
        };

        let command = value.to_str().ok_or_else(|| invalid("not valid UTF-8"))?;
        let words = shlex::split(command).ok_or_else(|| invalid("unbalanced quotes"))?;
        MakeInvoker::from_words(words).ok_or_else(|| invalid("the command is empty"))
    }
}
