/// Print an error followed by every `source` beneath it. Used by the `Debug`
/// impls of our error enums, so that `error.cause_chain=?e` in a log event
/// shows the whole chain instead of the outermost variant.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}

/// One-line version of `error_chain_fmt`: every message in the chain, joined
/// by `: `. For errors whose `Display` hides the cause (reqwest's "error
/// sending request" says nothing about timeouts vs refused connections).
pub fn error_chain_message(e: &impl std::error::Error) -> String {
    let mut message = e.to_string();
    let mut current = e.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
