//! Events Text Parser
//! Reads and writes the text editing form of a state's event list:
//! one `trigger[condition]/` header per event followed by its actions,
//! one per line or separated by `;`.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::fsm::{Action, Condition, Event, EventData, Operator, Variable, SYSTEM_COMPONENT};


#[derive(Parser)]
#[grammar = "parser/events.pest"]
pub struct EventsParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    PestError(#[from] pest::error::Error<Rule>),
    #[error("Invalid syntax at line {line}: {message}")]
    SyntaxError { line: usize, message: String },
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse the text form into an event list
pub fn parse_events(source: &str) -> ParseResult<Vec<EventData>> {
    let mut events = Vec::new();
    for pair in EventsParser::parse(Rule::events, source)? {
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::event {
                events.push(parse_event(inner)?);
            }
        }
    }
    Ok(events)
}

/// Text form of an event list, accepted back by [`parse_events`]
pub fn serialize_events(events: &[EventData]) -> String {
    events
        .iter()
        .map(serialize_event)
        .collect::<Vec<_>>()
        .join("\n")
}

fn serialize_event(event: &EventData) -> String {
    let mut header = if event.trigger.is_system() {
        event.trigger.method.clone()
    } else {
        call_text(&event.trigger.component, &event.trigger.method, &event.trigger.args)
    };
    if let Some(condition) = &event.condition {
        header.push_str(&format!("[{}]", condition_text(condition)));
    }
    header.push('/');

    std::iter::once(header)
        .chain(event.actions.iter().map(|a| a.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like the `Display` form, but values that would not read back as a bare
/// value are written quoted
fn condition_text(condition: &Condition) -> String {
    match condition {
        Condition::Value { value } if needs_quotes(value) => {
            format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
        }
        Condition::Value { .. } | Condition::Component { .. } => condition.to_string(),
        Condition::Operator {
            operator,
            left,
            right,
        } => {
            let side = |c: &Condition| match c {
                Condition::Operator { .. } => format!("({})", condition_text(c)),
                _ => condition_text(c),
            };
            format!("{} {} {}", side(left), operator.symbol(), side(right))
        }
    }
}

fn needs_quotes(value: &str) -> bool {
    let reserved = |c: char| "[]()=!<>\"".contains(c) || c.is_whitespace();
    // `a.b` would read back as a component variable
    let looks_like_variable = value.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && value.contains('.');
    value.is_empty() || value.contains(reserved) || looks_like_variable
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn call_text(component: &str, method: &str, args: &[String]) -> String {
    if args.is_empty() {
        format!("{}.{}", component, method)
    } else {
        format!("{}.{}({})", component, method, args.join(", "))
    }
}

// ============================================================================
// Pair walking
// ============================================================================

fn line_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn expect<'i>(pair: Option<Pair<'i, Rule>>, line: usize, what: &str) -> ParseResult<Pair<'i, Rule>> {
    pair.ok_or_else(|| ParseError::SyntaxError {
        line,
        message: format!("expected {}", what),
    })
}

fn parse_event(pair: Pair<Rule>) -> ParseResult<EventData> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let header = expect(inner.next(), line, "event header")?;

    let mut header_inner = header.into_inner();
    let trigger = parse_trigger(expect(header_inner.next(), line, "trigger")?)?;
    let mut event = EventData::new(trigger);
    if let Some(guard) = header_inner.next() {
        let condition = expect(guard.into_inner().next(), line, "condition")?;
        event.condition = Some(parse_condition(condition)?);
    }

    if let Some(actions) = inner.next() {
        for action in actions.into_inner() {
            let (component, method, args) = parse_call(action)?;
            event.actions.push(Action {
                component,
                method,
                args,
            });
        }
    }
    Ok(event)
}

fn parse_trigger(pair: Pair<Rule>) -> ParseResult<Event> {
    let line = line_of(&pair);
    let inner = expect(pair.into_inner().next(), line, "trigger")?;
    match inner.as_rule() {
        Rule::call => {
            let (component, method, args) = parse_call(inner)?;
            Ok(Event {
                component,
                method,
                args,
            })
        }
        Rule::system_signal => Ok(Event::new(SYSTEM_COMPONENT, inner.as_str().trim())),
        rule => Err(ParseError::SyntaxError {
            line,
            message: format!("unexpected {:?} in trigger", rule),
        }),
    }
}

/// `component.method(args)` shared by triggers, actions and variables
fn parse_call(pair: Pair<Rule>) -> ParseResult<(String, String, Vec<String>)> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let component = expect(inner.next(), line, "component name")?.as_str().to_string();
    let method = expect(inner.next(), line, "method name")?.as_str().to_string();
    let args = inner
        .next()
        .map(|args| {
            args.into_inner()
                .map(|arg| arg.as_str().trim().to_string())
                .collect()
        })
        .unwrap_or_default();
    Ok((component, method, args))
}

fn parse_condition(pair: Pair<Rule>) -> ParseResult<Condition> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let left = parse_operand(expect(inner.next(), line, "operand")?)?;
    let Some(operator) = inner.next() else {
        return Ok(left);
    };
    let operator = Operator::from_symbol(operator.as_str())
        .ok_or_else(|| ParseError::UnknownOperator(operator.as_str().to_string()))?;
    let right = parse_operand(expect(inner.next(), line, "right operand")?)?;
    Ok(Condition::compare(operator, left, right))
}

fn parse_operand(pair: Pair<Rule>) -> ParseResult<Condition> {
    let line = line_of(&pair);
    let inner = expect(pair.into_inner().next(), line, "operand")?;
    match inner.as_rule() {
        Rule::condition => parse_condition(inner),
        Rule::variable => {
            let (component, method, args) = parse_call(inner)?;
            Ok(Condition::Component {
                variable: Variable {
                    component,
                    method,
                    args,
                },
            })
        }
        Rule::quoted => {
            let text = inner.into_inner().next().map(|t| t.as_str()).unwrap_or_default();
            Ok(Condition::value(unescape(text)))
        }
        Rule::value => Ok(Condition::value(inner.as_str())),
        rule => Err(ParseError::SyntaxError {
            line,
            message: format!("unexpected {:?} in condition", rule),
        }),
    }
}
