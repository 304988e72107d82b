//! Minimal `go.mod` editing: rewrites the version of `require` directives in
//! both the single line and the block form, leaving everything else
//! (indentation, comments, other directives) untouched.

/// Module path and required version of a `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub module: String,
    pub version: String,
}

/// Every `require` entry in file order.
pub fn requirements(content: &str) -> Vec<Requirement> {
    let mut found = vec![];
    let mut in_block = false;

    for line in content.lines() {
        if let Some((requirement, block)) = parse_line(line, in_block) {
            in_block = block;
            if let Some(requirement) = requirement {
                found.push(requirement);
            }
        }
    }

    found
}

/// Whether the file requires `module`.
pub fn requires(content: &str, module: &str) -> bool {
    requirements(content).iter().any(|r| r.module == module)
}

/// Set the version of every requirement for which `should_update` returns
/// true. Returns the new content and whether anything changed.
pub fn update_requirements(
    content: &str,
    version: &str,
    should_update: impl Fn(&str) -> bool,
) -> (String, bool) {
    let mut output = String::with_capacity(content.len());
    let mut in_block = false;
    let mut changed = false;

    for line in content.split_inclusive('\n') {
        let Some((requirement, block)) = parse_line(line, in_block) else {
            output.push_str(line);
            continue;
        };

        in_block = block;

        match requirement {
            Some(req)
                if req.version != version && should_update(&req.module) =>
            {
                output.push_str(&replace_version(line, &req, version));
                changed = true;
            }
            _ => output.push_str(line),
        }
    }

    (output, changed)
}

/// Returns None for lines unrelated to `require`, otherwise the requirement
/// on the line (if any) and whether the following line is inside a block.
fn parse_line(
    line: &str,
    in_block: bool,
) -> Option<(Option<Requirement>, bool)> {
    let code = line.split("//").next().unwrap_or_default().trim();

    if in_block {
        if code == ")" {
            return Some((None, false));
        }
        return Some((parse_requirement(code), true));
    }

    let rest = code.strip_prefix("require")?;

    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim();

    if rest == "(" {
        return Some((None, true));
    }

    Some((parse_requirement(rest), false))
}

fn parse_requirement(code: &str) -> Option<Requirement> {
    let mut parts = code.split_whitespace();
    let module = parts.next()?.trim_matches('"');
    let version = parts.next()?;

    Some(Requirement {
        module: module.to_string(),
        version: version.to_string(),
    })
}

fn replace_version(line: &str, req: &Requirement, version: &str) -> String {
    let Some(module_start) = line.find(&req.module) else {
        return line.to_string();
    };

    let after_module = module_start + req.module.len();

    match line[after_module..].find(&req.version) {
        Some(offset) => {
            let start = after_module + offset;
            let end = start + req.version.len();
            format!("{}{}{}", &line[..start], version, &line[end..])
        }
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r#"module github.com/acme/app

go 1.22

require github.com/acme/single v0.1.0

require (
	github.com/acme/lib v1.0.0
	github.com/acme/lib-extra v1.0.0 // indirect
	github.com/other/thing v0.3.0
)

replace github.com/acme/lib => ../lib
"#;

    #[test]
    fn parses_single_and_block_requirements() {
        let modules = requirements(GO_MOD)
            .into_iter()
            .map(|r| r.module)
            .collect::<Vec<String>>();

        assert_eq!(
            modules,
            vec![
                "github.com/acme/single",
                "github.com/acme/lib",
                "github.com/acme/lib-extra",
                "github.com/other/thing",
            ]
        );
        assert!(requires(GO_MOD, "github.com/acme/lib"));
        assert!(!requires(GO_MOD, "github.com/acme"));
    }

    #[test]
    fn updates_matching_requirements_only() {
        let (updated, changed) =
            update_requirements(GO_MOD, "v2.0.0", |m| m.starts_with("github.com/acme/lib"));

        assert!(changed);
        assert!(updated.contains("\tgithub.com/acme/lib v2.0.0\n"));
        assert!(
            updated.contains("\tgithub.com/acme/lib-extra v2.0.0 // indirect\n")
        );
        assert!(updated.contains("require github.com/acme/single v0.1.0\n"));
        assert!(updated.contains("\tgithub.com/other/thing v0.3.0\n"));
        assert!(updated.contains("replace github.com/acme/lib => ../lib\n"));
    }

    #[test]
    fn updates_single_line_form() {
        let (updated, changed) = update_requirements(GO_MOD, "v0.2.0", |m| {
            m == "github.com/acme/single"
        });

        assert!(changed);
        assert!(updated.contains("require github.com/acme/single v0.2.0\n"));
    }

    #[test]
    fn reports_no_change_when_already_at_version() {
        let (updated, changed) =
            update_requirements(GO_MOD, "v0.3.0", |m| m == "github.com/other/thing");

        assert!(!changed);
        assert_eq!(updated, GO_MOD);
    }
}
