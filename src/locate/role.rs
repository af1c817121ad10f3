use std::sync::OnceLock;

use regex::Regex;

/// A `role[description]` query decomposed into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleQuery {
    pub role: String,
    pub description: String,
}

/// Recognize the `role[description]` micro-syntax. Anything that does not
/// match the full pattern (unbalanced brackets included) is simply not a
/// role query and yields `None`.
pub fn parse_role_syntax(text: &str) -> Option<RoleQuery> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"^(\w+)\[([^\]]+)\]$").expect("role syntax pattern"));
    let caps = re.captures(text.trim())?;
    Some(RoleQuery {
        role: caps[1].to_string(),
        description: caps[2].trim().to_string(),
    })
}

/// Selector covering the elements that can carry a role, implicitly via tag
/// semantics or explicitly via the `role` attribute. Roles outside this
/// vocabulary fall back to an explicit `[role=...]` scan.
pub fn role_selector(role: &str) -> Option<&'static str> {
    Some(match role {
        "button" => "button, input[type='button'], input[type='submit'], input[type='reset'], [role='button']",
        "textbox" => {
            "input[type='text'], input[type='email'], input[type='password'], input[type='search'], \
             input[type='tel'], input[type='url'], input:not([type]), textarea, [role='textbox']"
        }
        "checkbox" => "input[type='checkbox'], [role='checkbox']",
        "radio" => "input[type='radio'], [role='radio']",
        "link" => "a[href], [role='link']",
        "heading" => "h1, h2, h3, h4, h5, h6, [role='heading']",
        "list" => "ul, ol, [role='list']",
        "listitem" => "li, [role='listitem']",
        "img" => "img, [role='img']",
        "table" => "table, [role='table']",
        "row" => "tr, [role='row']",
        "cell" => "td, th, [role='cell']",
        "form" => "form, [role='form']",
        "navigation" => "nav, [role='navigation']",
        "main" => "main, [role='main']",
        "complementary" => "aside, [role='complementary']",
        "contentinfo" => "footer, [role='contentinfo']",
        "banner" => "header, [role='banner']",
        "search" => "[role='search']",
        "alert" => "[role='alert']",
        "dialog" => "dialog, [role='dialog']",
        "menu" => "menu, [role='menu']",
        "menuitem" => "[role='menuitem']",
        "tab" => "[role='tab']",
        "tabpanel" => "[role='tabpanel']",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let query = parse_role_syntax("button[Submit Form]").unwrap();
        assert_eq!(query.role, "button");
        assert_eq!(query.description, "Submit Form");
    }

    #[test]
    fn test_parse_trims_description() {
        let query = parse_role_syntax("textbox[  email address ]").unwrap();
        assert_eq!(query.description, "email address");
    }

    #[test]
    fn test_free_text_is_not_role_syntax() {
        assert_eq!(parse_role_syntax("login button"), None);
    }

    #[test]
    fn test_malformed_input_yields_none() {
        assert_eq!(parse_role_syntax("button[unclosed"), None);
        assert_eq!(parse_role_syntax("button]backwards["), None);
        assert_eq!(parse_role_syntax("[no role]"), None);
        assert_eq!(parse_role_syntax("button[]"), None);
        assert_eq!(parse_role_syntax(""), None);
    }

    #[test]
    fn test_known_roles_have_selectors() {
        for role in ["button", "textbox", "link", "dialog", "tabpanel"] {
            assert!(role_selector(role).is_some(), "missing selector for {role}");
        }
        assert_eq!(role_selector("treegrid"), None);
    }
}
