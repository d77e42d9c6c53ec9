//! Gosub target grammar
//!
//! Targets take the host's standard form `[context,]extension,priority`
//! with an optional trailing `(arg1,arg2,...)` argument list. The first `(`
//! terminates the label; `,` separates both label fields and arguments and
//! cannot be embedded in an argument at this layer.

use tracing::warn;

use crate::error::StackError;

/// Hard cap on Gosub arguments
pub const MAX_ARGS: usize = 100;

/// Priority field of a parsed target: numeric, or a label for the executor
/// to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrioritySpec {
    Number(u32),
    Label(String),
}

/// A parsed Gosub target
///
/// `context` and `extension` are `None` when omitted; the caller substitutes
/// the channel's current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GosubTarget {
    pub context: Option<String>,
    pub extension: Option<String>,
    pub priority: PrioritySpec,
    pub args: Vec<String>,
}

/// Parse a Gosub target string
pub fn parse(data: &str) -> Result<GosubTarget, StackError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(StackError::InvalidArguments {
            msg: "missing target".to_string(),
        });
    }

    let (label, args) = match data.split_once('(') {
        Some((label, rest)) => (label, parse_args(data, rest)?),
        None => (data, Vec::new()),
    };

    let fields: Vec<&str> = label.split(',').map(str::trim).collect();
    let (context, extension, priority) = match fields.as_slice() {
        [priority] => (None, None, *priority),
        [extension, priority] => (None, Some(*extension), *priority),
        [context, extension, priority] => (Some(*context), Some(*extension), *priority),
        _ => {
            return Err(StackError::InvalidTarget {
                target: data.to_string(),
            })
        }
    };
    if priority.is_empty() {
        return Err(StackError::InvalidTarget {
            target: data.to_string(),
        });
    }

    let priority = match priority.parse::<u32>() {
        Ok(n) => PrioritySpec::Number(n),
        Err(_) => PrioritySpec::Label(priority.to_string()),
    };

    Ok(GosubTarget {
        context: context.filter(|c| !c.is_empty()).map(str::to_string),
        extension: extension.filter(|e| !e.is_empty()).map(str::to_string),
        priority,
        args,
    })
}

fn parse_args(data: &str, rest: &str) -> Result<Vec<String>, StackError> {
    // the first ')' closes the list; anything after it is ignored
    let inner = match rest.find(')') {
        Some(close) => &rest[..close],
        None => {
            warn!(target_string = data, "missing ')' in argument list");
            rest
        }
    };
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    let args: Vec<String> = inner.split(',').map(str::to_string).collect();
    if args.len() > MAX_ARGS {
        return Err(StackError::InvalidArguments {
            msg: format!("{} arguments exceeds the maximum of {}", args.len(), MAX_ARGS),
        });
    }
    Ok(args)
}

/// The two branches of a `GosubIf` argument, split on the first `?` and `:`
#[derive(Debug, PartialEq, Eq)]
pub struct CondBranches<'a> {
    pub condition: &'a str,
    pub if_true: Option<&'a str>,
    pub if_false: Option<&'a str>,
}

/// Split `condition ? true_target [: false_target]`
pub fn parse_gosub_if(data: &str) -> Result<CondBranches<'_>, StackError> {
    let Some((condition, branches)) = data.split_once('?') else {
        return Err(StackError::InvalidArguments {
            msg: "GosubIf requires a condition separated by '?'".to_string(),
        });
    };
    let (if_true, if_false) = match branches.split_once(':') {
        Some((t, f)) => (t, Some(f)),
        None => (branches, None),
    };
    Ok(CondBranches {
        condition: condition.trim(),
        if_true: Some(if_true).filter(|t| !t.trim().is_empty()),
        if_false: if_false.filter(|f| !f.trim().is_empty()),
    })
}

/// Host truthiness: non-empty, non-"0", non-"false"
pub fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
