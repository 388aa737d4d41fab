use syn::parse::{Parse, Parser};

pub trait SynHelpers: AsRef<str> {
    fn parse_syn<T: Parse>(&self) -> syn::Result<T> {
        syn::parse_str(self.as_ref())
    }

    fn parse_outer_attributes(&self) -> syn::Result<Vec<syn::Attribute>> {
        syn::Attribute::parse_outer.parse_str(self.as_ref())
    }
}

impl<T: AsRef<str>> SynHelpers for T {}
