#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use urlquery::QueryDecode;

#[derive(Debug, Default, Clone, QueryDecode)]
struct ChildRequired {
    #[query = "desc,required"]
    description: String,
    #[query = "Long,vip"]
    long: u16,
    #[query = "-"]
    height: i32,
}

/// Decode `data` into a fresh `T` and return the missing parameter path, if any.
fn missing_param<T: QueryDecode + Default>(data: &str) -> Option<String> {
    match urlquery::from_str::<T>(data) {
        Ok(_) => None,
        Err(err) => {
            assert!(err.is_missing_param(), "unexpected error: {err}");
            Some(err.path().to_owned())
        }
    }
}

#[test]
fn required_scalars() {
    #[derive(Debug, Default, QueryDecode)]
    struct Str {
        #[query = "str,required"]
        s: String,
    }
    #[derive(Debug, Default, QueryDecode)]
    struct I64 {
        #[query(rename = "i64", required)]
        n: i64,
    }
    assert_eq!(missing_param::<Str>("").as_deref(), Some("str"));
    assert_eq!(missing_param::<I64>("").as_deref(), Some("i64"));
    assert_eq!(missing_param::<I64>("i64=3"), None);
}

#[test]
fn required_match_needs_bracket_boundary() {
    #[derive(Debug, Default, QueryDecode)]
    struct Strs {
        #[query = "strs,required"]
        strs: Vec<String>,
    }
    assert_eq!(missing_param::<Strs>("strszl=foo").as_deref(), Some("strs"));
    assert_eq!(missing_param::<Strs>("strs[0]=foo"), None);
}

#[test]
fn required_inside_slice_elements() {
    #[derive(Debug, Default, QueryDecode)]
    struct Optional {
        children: Vec<ChildRequired>,
    }
    #[derive(Debug, Default, QueryDecode)]
    struct Required {
        #[query = "children,required"]
        children: Vec<ChildRequired>,
    }

    assert_eq!(missing_param::<Optional>(""), None);
    assert_eq!(missing_param::<Required>("").as_deref(), Some("children"));
    assert_eq!(
        missing_param::<Optional>("children[3][Long]=0").as_deref(),
        Some("children[3][desc]")
    );
    assert_eq!(
        missing_param::<Optional>("children[3][Long]=0&children[3][desc][foo]=sdf").as_deref(),
        Some("children[3][desc]")
    );
}

#[test]
fn required_behind_option() {
    #[derive(Debug, Default, QueryDecode)]
    struct Required {
        #[query = "child,required"]
        child: Option<ChildRequired>,
    }
    #[derive(Debug, Default, QueryDecode)]
    struct Optional {
        child: Option<ChildRequired>,
    }

    assert_eq!(missing_param::<Required>("").as_deref(), Some("child"));
    assert_eq!(missing_param::<Optional>(""), None);
    assert_eq!(
        missing_param::<Optional>("child[Long]=0").as_deref(),
        Some("child[desc]")
    );
}

#[test]
fn required_inside_plain_struct() {
    #[derive(Debug, Default, QueryDecode)]
    struct Required {
        #[query = "child,required"]
        child: ChildRequired,
    }
    #[derive(Debug, Default, QueryDecode)]
    struct Optional {
        child: ChildRequired,
    }

    assert_eq!(missing_param::<Required>("").as_deref(), Some("child"));
    assert_eq!(missing_param::<Optional>("").as_deref(), Some("child[desc]"));
    assert_eq!(
        missing_param::<Optional>("child[Long]=0").as_deref(),
        Some("child[desc]")
    );
}

#[test]
fn required_maps() {
    #[derive(Debug, Default, QueryDecode)]
    struct Meta {
        #[query = "metadata,required"]
        metadata: HashMap<String, String>,
    }
    assert_eq!(missing_param::<Meta>("metadata[foo]=bar"), None);
    assert_eq!(missing_param::<Meta>("").as_deref(), Some("metadata"));
}

#[test]
fn missing_required_stops_later_fields() {
    #[derive(Debug, Default, QueryDecode)]
    struct Ordered {
        before: String,
        #[query(required)]
        needed: String,
        after: String,
    }
    let mut v = Ordered::default();
    let err = urlquery::unmarshal(b"before=1&after=2", &mut v).unwrap_err();
    assert_eq!(err.path(), "needed");
    assert_eq!(v.before, "1");
    assert_eq!(v.after, "");
}

#[test]
fn required_with_matching_subtree_but_no_value() {
    #[derive(Debug, Default, QueryDecode)]
    struct Scalar {
        #[query = "n,required"]
        n: u8,
    }
    assert_eq!(missing_param::<Scalar>("n[x]=1").as_deref(), Some("n"));
}
