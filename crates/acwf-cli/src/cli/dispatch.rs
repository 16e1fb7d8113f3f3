use std::path::Path;

pub(super) const PROGRAM_NAME: &str = "acwf";

/// Executable names that stand for one subcommand.
const PROGRAM_ALIASES: [(&str, &str); 2] = [("acwf-plot", "plot"), ("acwf-submit-eos", "submit-eos")];

pub(super) fn command_alias_from_program_name(program_name: &str) -> Option<&'static str> {
    let executable_name = Path::new(program_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program_name);
    let normalized = executable_name
        .strip_suffix(".exe")
        .unwrap_or(executable_name);

    if normalized == PROGRAM_NAME {
        return None;
    }

    PROGRAM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, command)| *command)
}
