use proc_macro2::TokenStream;
use syn::{parse_quote, Generics, Type, WhereClause, WherePredicate};

pub(crate) fn add_where_bound(wc: &mut WhereClause, ty: &Type, bound: TokenStream) {
    let pred: WherePredicate = parse_quote!(#ty: #bound);
    wc.predicates.push(pred);
}

/// The input's where clause, extended with `T: 'static` for every type parameter.
pub(crate) fn where_clause_of(generics: &Generics) -> WhereClause {
    let mut wc = generics.where_clause.clone().unwrap_or_else(|| WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    });
    for param in generics.type_params() {
        let ident = &param.ident;
        wc.predicates.push(parse_quote!(#ident: 'static));
    }
    wc
}
