/// Implements [`Bencode`](crate::Bencode) for a struct from a list of its
/// fields and their wire keys.
///
/// Each entry is one of:
///
/// - `"key" => field` stores `field` under `key`;
/// - `"key" => field [omit_empty]` leaves the entry out when the field is zero;
/// - `flatten field` inlines the entries of an embedded record.
///
/// Decode errors name fields by their Rust names.
///
/// # Examples
///
/// ```
/// use bencoding::{decode, encode, record};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Info {
///     name: String,
///     piece_length: u64,
/// }
///
/// record! {
///     Info {
///         "name" => name,
///         "piece length" => piece_length,
///     }
/// }
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Torrent {
///     announce: String,
///     comment: String,
///     info: Info,
/// }
///
/// record! {
///     Torrent {
///         "announce" => announce,
///         "comment" => comment [omit_empty],
///         "info" => info,
///     }
/// }
///
/// let torrent = Torrent {
///     announce: "http://tracker".into(),
///     comment: String::new(),
///     info: Info { name: "a.txt".into(), piece_length: 16384 },
/// };
/// let encoded = encode(&torrent).unwrap();
/// assert_eq!(
///     encoded,
///     b"d8:announce14:http://tracker4:infod4:name5:a.txt12:piece lengthi16384eee"
/// );
/// assert_eq!(decode::<Torrent>(&encoded).unwrap(), torrent);
/// ```
#[macro_export]
macro_rules! record {
    (@fields $b:expr; ) => {
        $b.build()
    };
    (@fields $b:expr; flatten $field:ident $(, $($rest:tt)*)?) => {
        $crate::record!(@fields $b.flatten(
            stringify!($field),
            |r: &Self| &r.$field,
            |r: &mut Self| &mut r.$field,
        ); $($($rest)*)?)
    };
    (@fields $b:expr; $key:literal => $field:ident [omit_empty] $(, $($rest:tt)*)?) => {
        $crate::record!(@fields $b.field_omit_empty(
            $key,
            |r: &Self| &r.$field,
            |r: &mut Self| &mut r.$field,
        ).named(stringify!($field)); $($($rest)*)?)
    };
    (@fields $b:expr; $key:literal => $field:ident $(, $($rest:tt)*)?) => {
        $crate::record!(@fields $b.field(
            $key,
            |r: &Self| &r.$field,
            |r: &mut Self| &mut r.$field,
        ).named(stringify!($field)); $($($rest)*)?)
    };
    ($ty:ty { $($body:tt)* }) => {
        impl $crate::Bencode for $ty {
            fn compile(c: &mut $crate::Compiler) -> $crate::Result<$crate::Codec<Self>> {
                $crate::record!(@fields c.record::<Self>(); $($body)*)
            }
        }
    };
}
