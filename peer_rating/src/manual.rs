/*!

This is the long-form manual for `peer_rating` and `peerrank`.

## Input formats

The ratings are a square table. The first row holds the names of the people
being rated, the first column holds the names of the people giving the
ratings. The cell at the crossing of a row and a column is how the row
person rated the column person, on a scale from 0 to 10. The diagonal holds
the self-ratings.

```text
Name,  Asha, Ben, Chloe
Asha,  9,    7,   8
Ben,   6,    7,   7
Chloe, 8,    8,   8
```

The following formats are supported by `peerrank`:
* `csv` Comma Separated Values
* `excel` Excel or OpenDocument workbooks (`.xlsx`, `.xls`, `.ods`). The first worksheet is used
 unless `--excel-worksheet-name` is given.

When no input type is given, it is deduced from the file extension.

Every cell must be filled. Blank cells, text that is not a number and values
outside of [0, 10] are reported and nothing is ranked.

## Scoring

### `pairwiseElo` (default)

Everybody starts at 1500 points. For each pair of participants, the rating
one gave to the other is compared with the outcome expected from their
current points, and both move accordingly:

```text
K        = 32 * (1 + |given - received| / 10)
expected = 1 / (1 + 10^((elo[ratee] - elo[rater]) / 400))
elo[rater] += K * (given / 10 - expected)
elo[ratee] += K * (received / 10 - (1 - expected))
```

The Elo value is then scaled by the self-rating and by the average rating
received from the others, each worth up to 20%:

```text
score = elo * (0.8 + 0.2 * self / 10) * (0.8 + 0.2 * others / 10)
```

The difference column is `score - self`.

Two rules control the pass over the pairs:
* `pairCoverage`: `orderedPairs` (default) compares every pair in both
 directions, `unorderedPairs` compares every pair once.
* `updateSchedule`: `simultaneous` (default) computes all the expectations
 from the points at the start of the pass, so the order of the participants
 does not matter. `sequential` applies every update immediately, which makes
 the outcome depend on the order of the participants in the file. Use
 `sequential` to reproduce the numbers of the historical scoring sheets.

Better ratings from the others usually raise the score, but not always: a
raise that narrows the gap between the two ratings of a pair also lowers the
K factor of that pair. When the rating gap is large and there are many
participants, the smaller Elo gain can outweigh the better average. With 20
participants, raising a rating received from 0 to 1, against a rating of 10
given in return, lowers the score slightly.

### `weightedAverage`

```text
score = 0.3 * self + 0.7 * others
```

The weight of the self-rating can be changed with `selfWeight`. The
difference column is `self - others`.

## Ranking

Higher scores rank first. Equal scores share the best rank of their group and
the next score continues after the group: the scores `10, 10, 8` get the ranks
`1, 1, 3`.

## Configuration

The `--config` flag accepts a JSON file:

```json
{
  "outputSettings": {
    "title": "Coffee house staff review",
    "date": "2024-06-01",
    "generateChart": true
  },
  "ratingFileSource": {
    "provider": "csv",
    "filePath": "ratings.csv",
    "nameColumnIndex": 1,
    "firstRatingColumnIndex": "B"
  },
  "rules": {
    "scoringMode": "pairwiseElo",
    "pairCoverage": "orderedPairs",
    "updateSchedule": "simultaneous"
  }
}
```

Column indexes start at 1 and can also be written as Excel column letters.
The path of the rating file is relative to the configuration file.

## Outputs

* the ranked table is printed on the standard output
* `--out` writes a JSON summary (`stdout` prints it instead)
* `--chart` writes a JSON description of a bar chart comparing the
 self-ratings with the averages received from the others
* `--reference` compares the summary with a stored one and fails on any
 difference

*/
