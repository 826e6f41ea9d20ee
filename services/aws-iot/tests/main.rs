// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

mod connector;

use iotsign_aws_iot::Credential;
use iotsign_core::time::{parse_rfc3339, DateTime};

pub const HOST: &str = "a1b2c3-ats.iot.eu-west-1.amazonaws.com";
pub const REGION: &str = "eu-west-1";

pub fn init_test() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_credential() -> Credential {
    Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY")
}

pub fn test_time() -> DateTime {
    parse_rfc3339("2024-06-30T23:59:59Z").expect("time must be valid")
}

/// Split a presigned url into `(prefix, [(key, value)])`.
pub fn split_url(url: &str) -> (&str, Vec<(&str, &str)>) {
    let (prefix, query) = url.split_once('?').expect("url must have a query");
    let pairs = query
        .split('&')
        .map(|kv| kv.split_once('=').expect("pair must have a value"))
        .collect();
    (prefix, pairs)
}
