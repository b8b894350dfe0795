use std::ffi::OsString;

/// Replace the program name with `display_name`, keeping every other argument.
///
/// An empty input (possible when the launcher is exec'd with no argv) still
/// yields a vector whose first element is the display name.
pub fn rewrite_argv<I>(real: I, display_name: &str) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut args = real.into_iter().map(Into::into);
    let _invoked_as = args.next();
    std::iter::once(OsString::from(display_name))
        .chain(args)
        .collect()
}
