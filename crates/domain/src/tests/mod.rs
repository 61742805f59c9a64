// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.


use crate::CsvRow;

pub fn branch_row() -> CsvRow {
    CsvRow {
        area_type: String::from("LBR"),
        area_id: String::from("1"),
        area_name: String::from("branch name"),
        area_gss: String::from("LBR_1"),
        gss_code: String::from("101"),
        parent_gss_code: String::from("LR_1"),
    }
}

pub fn region_row() -> CsvRow {
    CsvRow {
        area_type: String::from("LR"),
        area_id: String::from("1"),
        area_name: String::from("region name"),
        area_gss: String::from("LR_1"),
        gss_code: String::from("201"),
        parent_gss_code: String::new(),
    }
}
