//! jq pre-processing of input documents (via jaq). Each output of the filter
//! becomes one document handed to the decoder.
use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut documents = Vec::new();
    for (index, item) in outputs.enumerate() {
        let val = item.map_err(|e| anyhow!("jq filter `{filter_src}` failed: {e:?}"))?;
        // Val's Display is JSON text
        let document = serde_json::from_str::<Value>(&val.to_string())
            .with_context(|| format!("jq output #{index} is not valid JSON"))?;
        documents.push(document);
    }
    tracing::debug!(filter = filter_src, outputs = documents.len(), "applied jq filter");
    Ok(documents)
}

/// One line per syntax error in the filter source.
fn format_parse_errors(
    errs: Vec<(load::File<&str, ()>, load::Error<&str>)>,
) -> anyhow::Error {
    let lines: Vec<String> = errs
        .iter()
        .map(|(file, err)| format!("jq filter `{}` does not parse: {err:?}", file.code))
        .collect();
    anyhow!(lines.join("\n"))
}

/// One line per filter name that neither jaq-std nor jaq-json defines.
fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let lines: Vec<String> = errs
        .iter()
        .flat_map(|(file, list)| {
            list.iter().map(move |(name, undef)| {
                format!("jq filter `{}` uses undefined `{name}` ({undef:?})", file.code)
            })
        })
        .collect();
    anyhow!(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_nested_document() {
        let input = json!({ "payload": { "header": [], "details": null } });
        let out = run_jaq(".payload", &input).unwrap();
        assert_eq!(out, vec![json!({ "header": [], "details": null })]);
    }

    #[test]
    fn each_output_is_a_document() {
        let input = json!({ "pages": [{ "header": [] }, { "details": [] }] });
        let out = run_jaq(".pages[]", &input).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], json!({ "details": [] }));
    }

    #[test]
    fn bad_filter_names_the_filter() {
        let err = run_jaq(".[", &json!({})).unwrap_err();
        assert!(err.to_string().contains("jq filter `.[` does not parse"));
    }

    #[test]
    fn undefined_function_is_named() {
        let err = run_jaq("no_such_fn(1)", &json!({})).unwrap_err();
        assert!(err.to_string().contains("undefined `no_such_fn`"));
    }
}
