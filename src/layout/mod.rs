//! Layout-service client.
//!
//! A page request is turned into a [`LayoutRequest`], handed to a named
//! [`LayoutHandler`] through the [`LayoutClient`], and comes back as a
//! [`LayoutResponse`].

mod client;
mod handler;
mod http_handler;
mod request;
mod response;
mod serializer;

pub use client::{LayoutClient, LayoutClientBuilder};
pub use handler::{HandlerFactory, LayoutHandler};
pub use http_handler::HttpLayoutHandler;
pub use request::{API_KEY, ITEM, LANGUAGE, LayoutRequest, SITE};
pub use response::{Component, Context, LayoutResponse, PageState, Route, Site, SitecoreData};
pub use serializer::{JsonLayoutSerializer, LayoutSerializer};
