// Copyright 2024 pyke.io
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The crate-wide error type, aggregating the per-component error enums (§7). Most call sites
//! use the component errors directly (`eventclient::Error`, `image::FetchError`); this type
//! exists for callers that want to handle several components behind one `Result`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[cfg(feature = "eventapi")]
	#[error(transparent)]
	EventClient(#[from] crate::eventclient::Error),

	#[cfg(feature = "image-cache")]
	#[error(transparent)]
	ImageFetch(#[from] crate::image::FetchError),

	#[cfg(all(feature = "twitch", feature = "youtube"))]
	#[error(transparent)]
	TwitchMulticast(#[from] crate::MulticastError)
}
