use syn::{GenericArgument, Ident, Path, PathArguments, Type};

/// Returns true if `path` can only name the type being derived (`Name`, `crate::Name`, ...).
fn names_self(path: &Path, self_ident: &Ident) -> bool {
    let Some(last) = path.segments.last() else {
        return false;
    };
    if last.ident == "Self" && path.segments.len() == 1 {
        return true;
    }
    if last.ident != *self_ident {
        return false;
    }
    let parents = path.segments.len() - 1;
    path.segments
        .iter()
        .take(parents)
        .all(|seg| matches!(seg.ident.to_string().as_str(), "crate" | "self" | "super"))
}

/// Returns true if `ty` refers to the derived type anywhere, as in `Option<Box<Node>>`.
///
/// Such field types must not get a `QueryDecode` where bound or the impl becomes cyclic.
pub(crate) fn mentions_self(ty: &Type, self_ident: &Ident) -> bool {
    match ty {
        Type::Path(tp) => {
            if let Some(q) = &tp.qself {
                if mentions_self(&q.ty, self_ident) {
                    return true;
                }
            } else if names_self(&tp.path, self_ident) {
                return true;
            }
            tp.path.segments.iter().any(|seg| match &seg.arguments {
                PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                    GenericArgument::Type(inner) => mentions_self(inner, self_ident),
                    _ => false,
                }),
                _ => false,
            })
        }
        Type::Array(ta) => mentions_self(&ta.elem, self_ident),
        Type::Tuple(tt) => tt.elems.iter().any(|t| mentions_self(t, self_ident)),
        Type::Group(tg) => mentions_self(&tg.elem, self_ident),
        Type::Paren(tp) => mentions_self(&tp.elem, self_ident),
        _ => false,
    }
}
