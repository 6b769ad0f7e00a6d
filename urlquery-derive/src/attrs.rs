use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, Expr, ExprLit, Lit, LitStr, Meta};

#[derive(Default, Clone)]
pub(crate) struct QueryFieldAttr {
    pub(crate) rename: Option<LitStr>,
    pub(crate) required: bool,
    pub(crate) skip: bool,
    pub(crate) flatten: bool,
}

#[derive(Default, Clone, Copy)]
pub(crate) struct QueryContainerAttr {
    pub(crate) param: bool,
}

pub(crate) fn ensure_no_query_attrs(attrs: &[Attribute], ctx: &str) -> syn::Result<()> {
    for a in attrs {
        if a.path().is_ident("query") {
            return Err(syn::Error::new(
                a.span(),
                format!("`#[query(...)]` is not supported on {ctx}"),
            ));
        }
    }
    Ok(())
}

/// Apply a tag string: `"-"` skips, otherwise `name,flag,flag`.
fn apply_tag(out: &mut QueryFieldAttr, tag: &LitStr) -> syn::Result<()> {
    let value = tag.value();
    if value == "-" {
        out.skip = true;
        return Ok(());
    }
    let mut tokens = value.split(',');
    if let Some(name) = tokens.next().filter(|n| !n.is_empty()) {
        if out.rename.is_some() {
            return Err(syn::Error::new(tag.span(), "duplicate query field name"));
        }
        out.rename = Some(LitStr::new(name, tag.span()));
    }
    // Unknown flags are ignored.
    if tokens.any(|flag| flag == "required") {
        out.required = true;
    }
    Ok(())
}

pub(crate) fn parse_query_field_attrs(attrs: &[Attribute]) -> syn::Result<QueryFieldAttr> {
    let mut out = QueryFieldAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("query") {
            continue;
        }
        match &attr.meta {
            Meta::NameValue(nv) => {
                let Expr::Lit(ExprLit {
                    lit: Lit::Str(tag), ..
                }) = &nv.value
                else {
                    return Err(syn::Error::new(
                        nv.value.span(),
                        "expected a tag string like `#[query = \"name,required\"]`",
                    ));
                };
                apply_tag(&mut out, tag)?;
            }
            Meta::List(_) => {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("skip") {
                        if out.skip {
                            return Err(meta.error("duplicate `query(skip)`"));
                        }
                        out.skip = true;
                        return Ok(());
                    }
                    if meta.path.is_ident("required") {
                        if out.required {
                            return Err(meta.error("duplicate `query(required)`"));
                        }
                        out.required = true;
                        return Ok(());
                    }
                    if meta.path.is_ident("flatten") {
                        if out.flatten {
                            return Err(meta.error("duplicate `query(flatten)`"));
                        }
                        out.flatten = true;
                        return Ok(());
                    }
                    if meta.path.is_ident("rename") {
                        if out.rename.is_some() {
                            return Err(meta.error("duplicate `query(rename=...)`"));
                        }
                        let lit: LitStr = meta.value()?.parse()?;
                        out.rename = Some(lit);
                        return Ok(());
                    }
                    Err(meta.error(
                        "unsupported `query(...)` field attribute (allowed: rename, required, skip, flatten)",
                    ))
                })?;
            }
            Meta::Path(p) => {
                return Err(syn::Error::new(p.span(), "expected `#[query(...)]` or `#[query = \"...\"]`"));
            }
        }
    }

    if out.skip && (out.rename.is_some() || out.required || out.flatten) {
        return Err(syn::Error::new(
            Span::call_site(),
            "`query(skip)` cannot be combined with other field attributes",
        ));
    }
    if out.flatten && (out.rename.is_some() || out.required) {
        return Err(syn::Error::new(
            Span::call_site(),
            "`query(flatten)` cannot be combined with `rename` or `required`",
        ));
    }

    Ok(out)
}

pub(crate) fn parse_query_container_attrs(attrs: &[Attribute]) -> syn::Result<QueryContainerAttr> {
    let mut out = QueryContainerAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("query") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("param") {
                if out.param {
                    return Err(meta.error("duplicate `query(param)`"));
                }
                out.param = true;
                return Ok(());
            }
            Err(meta.error("unsupported `query(...)` container attribute (allowed: param)"))
        })?;
    }
    Ok(out)
}
