/*!

Reference notes on the questionnaire workbook layout and the generated files.

## Workbook layout

The data source is a single Excel (xlsx) workbook with fixed, named sheets:

* `Core Questionnaire` (required) — one column per indicator, one row per
  country. Rows 1, 3 and 4 carry the header text (row 2 duplicates row 4 and
  is skipped); row 4 is the one that fixes the value columns. Country names
  sit in column A from row 5 down.
* `Companion Questionnaire` (optional) — same layout, for the supplementary
  questionnaire of the earlier editions. Codes already present in the core
  sheet are ignored.
* `Transversal Themes` (optional) — one row per theme (header text in column
  A), one column per country (names in row 1). Theme scores are 0-1
  fractions.
* `Themes x Indicators` (optional) — the theme-to-indicator mapping: one row
  per pair, theme code in column A, indicator code in column B, with an
  optional title in column C for indicators absent from the catalog.
* `Summary` (optional) — pre-computed level-1 scores: indicator titles in
  row 1, one row per country. Columns are matched to the catalog by
  case-insensitive title equality.

Header cells encode an indicator as `<code><separator><title>`, where the
separator is a colon in the earlier editions and a plain space in the later
ones, eg `1.1: International Framework`. Cells whose first token carries a
`_year` suffix or a modifier tag (`3.2.1a_gp`) have no literal title; see
[`crate::parse_cell`].

## Generated files

* `indicators.json` — the nested indicator catalog (array of trees).
* `indicators.csv` — the flat catalog, columns `code,title,core,level`.
* `themes.json` — the nested theme catalog with mapped indicator lists.
* `scores_per_country.json`, `scores_per_country.csv` — level-1/level-2
  scores plus roll-ups per country.
* `c3_scores_per_country.json` — the chart-ready view: one object per
  country with proportional (100%-stacked) scores and theme scores keyed
  `t<code>`.
* `<ISO2>.json` — the full per-indicator values for one country.
* `countries_with_data.json` — ISO-2 code to display name for every country
  with real data.

*/
